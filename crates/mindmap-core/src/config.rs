//! Session configuration.

use crate::storage::{DEFAULT_AUTOSAVE_INTERVAL_SECS, MINDMAP_KEY};
use crate::surface::{LayoutPolicy, MAX_DIMENSION};
use crate::timer::DEFAULT_RESIZE_DEBOUNCE_MS;
use crate::tools::{DEFAULT_ERASER_WIDTH, DEFAULT_INK_WIDTH, Rgb, ToolState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-deployment settings. Every field is optional in the JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MindmapConfig {
    /// How the surface size follows its container.
    pub layout: LayoutPolicy,
    /// Initial ink colour.
    pub ink_color: Rgb,
    /// Initial ink width in logical pixels.
    pub ink_width: f64,
    /// Initial eraser width in logical pixels.
    pub eraser_width: f64,
    pub autosave_interval_secs: u64,
    pub resize_debounce_ms: u64,
    /// Storage key for the snapshot.
    pub storage_key: String,
    /// Largest device buffer edge.
    pub max_dimension: u32,
}

impl Default for MindmapConfig {
    fn default() -> Self {
        Self {
            layout: LayoutPolicy::Fill,
            ink_color: Rgb::BLACK,
            ink_width: DEFAULT_INK_WIDTH,
            eraser_width: DEFAULT_ERASER_WIDTH,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE_MS,
            storage_key: MINDMAP_KEY.to_string(),
            max_dimension: MAX_DIMENSION,
        }
    }
}

impl MindmapConfig {
    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    /// Initial tool state (ink mode).
    pub fn tool_state(&self) -> ToolState {
        ToolState::new(self.ink_color, self.ink_width, self.eraser_width)
    }
}
