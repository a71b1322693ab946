//! CLI command implementations.

pub mod collect;
pub mod preview;
pub mod upload;

pub use collect::CollectCommand;
pub use preview::PreviewCommand;
pub use upload::UploadCommand;
