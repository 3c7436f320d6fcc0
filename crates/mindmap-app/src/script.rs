//! Recorded event scripts and their replay.

use anyhow::{Context, Result};
use kurbo::Size;
use mindmap_core::{Control, HeadlessHost, Mindmap, MindmapEvent, Notification, Storage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// One step of a recorded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Let time pass, then fire due timers.
    Wait { ms: u64 },
    /// Change the container size.
    Resize { width: f64, height: f64 },
    /// Dispatch an event as-is.
    Event(MindmapEvent),
}

/// Read a script file (a JSON array of steps).
pub fn load(path: &Path) -> Result<Vec<Step>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid script {}", path.display()))
}

/// Drives a session on a virtual clock.
pub struct Replay<S: Storage> {
    session: Mindmap<S, HeadlessHost>,
    now: Instant,
    /// The most recent export, if one was requested.
    last_export: Option<Vec<u8>>,
}

impl<S: Storage> Replay<S> {
    pub fn new(session: Mindmap<S, HeadlessHost>, start: Instant) -> Self {
        Self {
            session,
            now: start,
            last_export: None,
        }
    }

    pub fn session(&self) -> &Mindmap<S, HeadlessHost> {
        &self.session
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn last_export(&self) -> Option<&[u8]> {
        self.last_export.as_deref()
    }

    pub fn run(&mut self, steps: &[Step]) {
        for step in steps {
            self.step(step.clone());
        }
    }

    pub fn step(&mut self, step: Step) {
        match step {
            Step::Wait { ms } => {
                self.now += Duration::from_millis(ms);
                self.dispatch(MindmapEvent::Tick);
            }
            Step::Resize { width, height } => {
                self.session.host_mut().size = Size::new(width, height);
                self.dispatch(MindmapEvent::ContainerResized);
            }
            Step::Event(event) => {
                let fullscreen_request = event == MindmapEvent::Control(Control::ToggleFullscreen);
                let was_fullscreen = self.session.host().is_fullscreen();
                self.dispatch(event);

                // A real host reports the transition asynchronously; the headless one switches at once.
                let is_fullscreen = self.session.host().is_fullscreen();
                if fullscreen_request && is_fullscreen != was_fullscreen {
                    self.dispatch(MindmapEvent::FullscreenChanged(is_fullscreen));
                }
            }
        }
    }

    /// Apply anything still pending and save before the session ends.
    pub fn finish(&mut self) {
        if let Some(deadline) = self.session.pending_resize() {
            self.now = self.now.max(deadline);
            self.dispatch(MindmapEvent::Tick);
        }
        self.dispatch(MindmapEvent::BeforeUnload);
    }

    fn dispatch(&mut self, event: MindmapEvent) {
        self.session.handle_event(event, self.now);
        for notification in self.session.take_notifications() {
            match notification {
                Notification::ExportReady(snapshot) => {
                    log::info!("Export ready ({} bytes)", snapshot.as_png().len());
                    self.last_export = Some(snapshot.into_png());
                }
                n @ Notification::Autosaved => log::debug!("{n}"),
                n if n.is_error() => log::warn!("{n}"),
                n => log::info!("{n}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_core::{MINDMAP_KEY, MemoryStorage, MindmapConfig};
    use std::sync::Arc;

    const SCRIPT: &str = r##"[
        {"event": {"control": {"set_color": "#0000ff"}}},
        {"event": {"pointer": {"mouse_down": {"position": {"x": 10.0, "y": 10.0}, "button": "left"}}}},
        {"event": {"pointer": {"mouse_move": {"position": {"x": 150.0, "y": 10.0}}}}},
        {"event": {"pointer": {"mouse_up": {"position": {"x": 150.0, "y": 10.0}, "button": "left"}}}},
        {"resize": {"width": 400.0, "height": 200.0}},
        {"wait": {"ms": 250}},
        {"event": {"control": "export"}}
    ]"##;

    fn replay(storage: Arc<MemoryStorage>, host: HeadlessHost) -> Replay<MemoryStorage> {
        let t0 = Instant::now();
        let session = Mindmap::new(MindmapConfig::default(), storage, host, t0).unwrap();
        Replay::new(session, t0)
    }

    #[test]
    fn test_script_replay() {
        let steps: Vec<Step> = serde_json::from_str(SCRIPT).unwrap();
        assert_eq!(steps.len(), 7);

        let storage = Arc::new(MemoryStorage::new());
        let mut replay = replay(storage.clone(), HeadlessHost::new(Size::new(200.0, 100.0), 1.0));
        replay.run(&steps);

        assert_eq!(replay.session().surface().width(), 400);
        assert!(!replay.session().surface().is_blank());
        assert!(replay.last_export().is_some());
        assert!(storage.exists(MINDMAP_KEY).unwrap());
    }

    #[test]
    fn test_fullscreen_request_reports_transition() {
        let host = HeadlessHost::new(Size::new(200.0, 100.0), 1.0).with_fullscreen(Size::new(640.0, 360.0));
        let mut replay = replay(Arc::new(MemoryStorage::new()), host);

        replay.step(Step::Event(MindmapEvent::Control(Control::ToggleFullscreen)));
        assert!(replay.session().presentation().is_fullscreen());

        replay.finish();
        assert_eq!(replay.session().surface().width(), 640);
    }

    #[test]
    fn test_load_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(&dir.path().join("missing.json")).is_err());

        let path = dir.path().join("script.json");
        std::fs::write(&path, r#"[{"wait": {"ms": 10}}, {"event": "before_unload"}]"#).unwrap();
        assert_eq!(load(&path).unwrap().len(), 2);
    }
}
