pub mod controller;
pub mod download;
pub mod endpoint;

pub use controller::{ControllerUpdate, WorkflowController};
pub use download::{DirectorySink, DownloadSink};
pub use endpoint::{ConversionEndpoint, HttpEndpoint};
