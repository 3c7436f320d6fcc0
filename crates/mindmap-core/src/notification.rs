//! Non-fatal messages for the surrounding UI.

use crate::snapshot::Snapshot;
use std::fmt;

/// Something the host should show or act on.
///
/// Failures are reported here instead of being returned, because none of
/// them stop the drawing session.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The surface was written to storage.
    Autosaved,
    /// Writing to storage failed; the previously stored snapshot is intact.
    SaveFailed(String),
    /// A stored or exported snapshot could not be decoded; the surface was left untouched.
    DecodeFailed(String),
    /// The surface could not be encoded for export.
    ExportFailed(String),
    /// The surface could not be laid out for the new container size; the old layout is kept.
    ResizeFailed(String),
    /// Clearing the stored snapshot failed.
    ClearFailed(String),
    /// A host capability (e.g. fullscreen) is not available.
    Unsupported(String),
    /// The requested export, reflecting the surface at request time.
    ExportReady(Snapshot),
}

impl Notification {
    /// Whether this reports a failure.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notification::SaveFailed(_)
                | Notification::DecodeFailed(_)
                | Notification::ExportFailed(_)
                | Notification::ResizeFailed(_)
                | Notification::ClearFailed(_)
                | Notification::Unsupported(_)
        )
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Autosaved => write!(f, "Mindmap autosaved"),
            Notification::SaveFailed(reason) => write!(f, "Autosave failed: {reason}"),
            Notification::DecodeFailed(reason) => write!(f, "Could not restore mindmap: {reason}"),
            Notification::ExportFailed(reason) => write!(f, "Export failed: {reason}"),
            Notification::ResizeFailed(reason) => write!(f, "Could not resize mindmap: {reason}"),
            Notification::ClearFailed(reason) => write!(f, "Could not remove saved mindmap: {reason}"),
            Notification::Unsupported(feature) => write!(f, "{feature} is not supported here"),
            Notification::ExportReady(snapshot) => {
                write!(f, "Export ready ({} bytes)", snapshot.as_png().len())
            }
        }
    }
}
