use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::utils::VerificationError;

/// Destination for verified document images. Storage itself (bucket, CDN,
/// database) belongs to the surrounding application; the coordinators only
/// need somewhere to put bytes and a URL back.
pub trait ImageStore {
    /// Persists `bytes` under `key` and returns a URL for the stored image.
    fn store(&self, key: &str, bytes: &[u8], content_type: &str)
        -> Result<String, VerificationError>;
}

/// Content-addressed storage key: the SHA-256 of the bytes plus the file
/// extension. Re-uploading the same image lands on the same key.
pub fn content_key(bytes: &[u8], extension: &str) -> String {
    let digest = Sha256::digest(bytes);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}.{}", hex, extension)
}

/// Local directory store, used by the demo binary and as the reference
/// `ImageStore` implementation.
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSystemStore { root: root.into() }
    }
}

impl ImageStore for FileSystemStore {
    fn store(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, VerificationError> {
        fs::create_dir_all(&self.root)
            .map_err(|e| VerificationError::Storage(format!("failed to create {}: {}", self.root.display(), e)))?;
        let path = self.root.join(key);
        fs::write(&path, bytes)
            .map_err(|e| VerificationError::Storage(format!("failed to write {}: {}", path.display(), e)))?;
        Ok(path.display().to_string())
    }
}
