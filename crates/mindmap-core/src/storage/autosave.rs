//! Auto-save functionality for the mindmap surface.
//!
//! Snapshots are written after every finished stroke, on a periodic timer
//! while there are unsaved changes, and right before the session ends.

use crate::snapshot::Snapshot;
use crate::storage::{Storage, StorageError, StorageResult};
use crate::timer::Interval;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key the mindmap snapshot is stored under.
///
/// Answer text is stored under assignment ids (`assignment…`), so this never collides.
pub const MINDMAP_KEY: &str = "mindmap";

/// Manages automatic snapshot persistence.
pub struct AutoSaveManager<S: Storage> {
    /// Storage backend.
    storage: Arc<S>,
    /// Key for the snapshot.
    key: String,
    /// Periodic save timer.
    timer: Interval,
    /// Last successful save timestamp.
    last_save: Option<Instant>,
    /// Whether the surface has changes not yet written.
    dirty: bool,
}

impl<S: Storage> AutoSaveManager<S> {
    /// Create a new auto-save manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            key: MINDMAP_KEY.to_string(),
            timer: Interval::new(Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS)),
            last_save: None,
            dirty: false,
        }
    }

    /// Use a different storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Set the auto-save interval.
    pub fn set_interval(&mut self, interval: Duration, now: Instant) {
        self.timer.set_period(interval, now);
    }

    /// Get the auto-save interval.
    pub fn interval(&self) -> Duration {
        self.timer.period()
    }

    /// Start the periodic timer.
    pub fn start(&mut self, now: Instant) {
        self.timer.start(now);
    }

    /// Stop the periodic timer.
    pub fn stop(&mut self) {
        self.timer.stop();
    }

    /// When the periodic timer next fires, if running.
    pub fn next_fire(&self) -> Option<Instant> {
        self.timer.next_fire()
    }

    /// Mark the surface as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if the surface has unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Time of the last successful save.
    pub fn last_save(&self) -> Option<Instant> {
        self.last_save
    }

    /// Advance the periodic timer. Returns true if a save is due now.
    ///
    /// The timer keeps running whether or not anything is dirty; only the
    /// answer depends on the dirty flag.
    pub fn poll(&mut self, now: Instant) -> bool {
        self.timer.poll(now) && self.dirty
    }

    /// Write the snapshot under the key.
    ///
    /// On failure the previously stored value is left as it was and the
    /// dirty flag stays set so the next trigger retries.
    pub fn save(&mut self, snapshot: &Snapshot, now: Instant) -> StorageResult<()> {
        self.storage.save(&self.key, &snapshot.to_data_url())?;
        self.last_save = Some(now);
        self.dirty = false;
        Ok(())
    }

    /// Read the stored value, if any.
    pub fn load(&mut self) -> StorageResult<Option<String>> {
        match self.storage.load(&self.key) {
            Ok(value) => {
                self.dirty = false;
                Ok(Some(value))
            }
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the stored snapshot. Nothing is left to save afterwards.
    pub fn clear(&mut self) -> StorageResult<()> {
        self.storage.delete(&self.key)?;
        self.dirty = false;
        Ok(())
    }

    /// Check if a snapshot is stored.
    pub fn has_snapshot(&self) -> StorageResult<bool> {
        self.storage.exists(&self.key)
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
