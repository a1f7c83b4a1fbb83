pub mod job;
pub mod kind;
pub mod message;
pub mod response;

pub use job::*;
pub use kind::*;
pub use message::*;
pub use response::*;
