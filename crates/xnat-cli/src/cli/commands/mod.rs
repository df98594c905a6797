//! CLI command handlers, one per file.

mod catalog;
mod checksum;
mod download;
mod upload;

pub use catalog::run_catalog;
pub use checksum::run_checksum;
pub use download::run_download;
pub use upload::run_upload;
