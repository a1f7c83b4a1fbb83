pub mod file;
pub mod validation;

pub use file::*;
pub use validation::validate_candidate;
