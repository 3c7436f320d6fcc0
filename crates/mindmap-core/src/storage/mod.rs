//! Durable string-keyed store for surface snapshots.

mod autosave;
mod file;
mod memory;

pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS, MINDMAP_KEY};
pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key not found: {0}")]
    NotFound(String),
    #[error("Quota exceeded writing '{key}': {needed} bytes, {quota} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A key-value store with string values, in the manner of browser local storage.
///
/// A `save` either replaces the whole value or fails leaving the previous
/// value in place; readers never observe a partial write.
pub trait Storage: Send + Sync {
    /// Write a value, replacing any previous one.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Read a value. Missing keys are `StorageError::NotFound`.
    fn load(&self, key: &str) -> StorageResult<String>;

    /// Remove a value. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// List all keys.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> StorageResult<bool>;
}
