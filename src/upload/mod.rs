pub mod coordinator;
pub mod storage;

pub use coordinator::{IdCardUpload, LicenseUpload, ProgressReporter, UploadCoordinator};
pub use storage::{content_key, FileSystemStore, ImageStore};
