//! Mindmap Core Library
//!
//! Platform-agnostic core of the mindmap surface: a persistent freehand
//! raster canvas with ink and eraser tools.

pub mod config;
pub mod host;
pub mod input;
pub mod mindmap;
pub mod notification;
pub mod render;
pub mod snapshot;
pub mod storage;
pub mod surface;
pub mod timer;
pub mod title;
pub mod tools;

pub use config::{ConfigError, MindmapConfig};
pub use host::{HeadlessHost, Host, HostError};
pub use input::{InputState, MouseButton, PointerEvent, StrokeCommand, TouchPoint};
pub use mindmap::{Control, Mindmap, MindmapEvent};
pub use notification::Notification;
pub use render::{StrokeRenderer, StrokeState};
pub use snapshot::{Snapshot, SnapshotError};
pub use storage::{AutoSaveManager, FileStorage, MemoryStorage, Storage, StorageError, MINDMAP_KEY};
pub use surface::{LayoutPolicy, Surface, SurfaceConfig, SurfaceError};
pub use timer::{Debounce, Interval};
pub use tools::{Brush, CompositeMode, Presentation, Rgb, ToolState};
