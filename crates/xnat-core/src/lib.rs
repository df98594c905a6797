pub mod config;
pub mod logging;

pub mod catalog;
pub mod checksum;
pub mod error;
pub mod property;
pub mod query;
pub mod resource;
pub mod transport;
pub mod uploader;

pub use error::UploadError;
pub use resource::{FileResource, RemoteResource};
pub use transport::{CurlSession, JobHandle, Transport};
pub use uploader::{UploadOutcome, VerifiedUploader};
