pub mod client;
pub mod error;
pub mod types;
pub mod upload;

pub use client::SinkClient;
pub use error::SinkError;
pub use types::{UploadPayload, UploadReport, UploadRow};
pub use upload::{upload_all, UploadConfig};
