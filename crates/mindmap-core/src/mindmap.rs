//! The mindmap session: surface, tools, input and persistence behind one dispatch point.

use crate::config::MindmapConfig;
use crate::host::{Host, HostError};
use crate::input::{InputState, PointerEvent, StrokeCommand};
use crate::notification::Notification;
use crate::render::StrokeRenderer;
use crate::snapshot::{Snapshot, SnapshotResult};
use crate::storage::{AutoSaveManager, Storage};
use crate::surface::{Surface, SurfaceConfig, SurfaceError};
use crate::timer::Debounce;
use crate::tools::{CompositeMode, Presentation, Rgb, ToolState};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Settings and triggers from the control strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    SetColor(Rgb),
    SetInkWidth(f64),
    SetEraserWidth(f64),
    ToggleEraser,
    Clear,
    ToggleFullscreen,
    /// Materialize the surface as a PNG (print/export).
    Export,
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MindmapEvent {
    Pointer(PointerEvent),
    /// The container changed size. The new size is queried from the host
    /// once the resize debounce settles.
    ContainerResized,
    /// The host entered (`true`) or left fullscreen.
    FullscreenChanged(bool),
    Control(Control),
    /// Time advanced; fires due timers.
    Tick,
    /// The session is about to end.
    BeforeUnload,
}

/// A drawing session.
///
/// All mutation goes through `&mut self`, so a redraw from a snapshot
/// (load or resize recovery) can never interleave with a stroke.
pub struct Mindmap<S: Storage, H: Host> {
    config: MindmapConfig,
    host: H,
    surface: Surface,
    tools: ToolState,
    presentation: Presentation,
    renderer: StrokeRenderer,
    input: InputState,
    autosave: AutoSaveManager<S>,
    resize: Debounce,
    notifications: Vec<Notification>,
}

impl<S: Storage, H: Host> Mindmap<S, H> {
    /// Lay out the surface for the host, restore the stored snapshot and
    /// start the autosave timer.
    ///
    /// Only a surface that cannot be allocated at all is an error; a missing
    /// or corrupt snapshot just leaves the surface blank.
    pub fn new(
        config: MindmapConfig,
        storage: Arc<S>,
        host: H,
        now: Instant,
    ) -> Result<Self, SurfaceError> {
        let surface_config = SurfaceConfig::compute(
            host.container_size(),
            host.device_pixel_ratio(),
            config.layout,
            config.max_dimension,
        )?;
        let surface = Surface::new(surface_config)?;

        let mut autosave = AutoSaveManager::new(storage).with_key(config.storage_key.clone());
        autosave.set_interval(config.autosave_interval(), now);
        if config.autosave_interval_secs > 0 {
            autosave.start(now);
        } else {
            log::info!("Periodic autosave disabled");
        }

        let mut mindmap = Self {
            tools: config.tool_state(),
            resize: Debounce::new(config.resize_debounce()),
            config,
            host,
            surface,
            presentation: Presentation::Normal,
            renderer: StrokeRenderer::new(),
            input: InputState::new(),
            autosave,
            notifications: Vec::new(),
        };
        mindmap.load();
        Ok(mindmap)
    }

    /// Single entry point for host events.
    pub fn handle_event(&mut self, event: MindmapEvent, now: Instant) {
        match event {
            MindmapEvent::Pointer(event) => {
                let origin = self.host.container_origin();
                if let Some(command) = self.input.handle_pointer_event(&event, origin) {
                    self.apply_stroke_command(command, now);
                }
            }
            MindmapEvent::ContainerResized => self.resize.arm(now),
            MindmapEvent::FullscreenChanged(active) => {
                let presentation = Presentation::from_fullscreen(active);
                if presentation != self.presentation {
                    log::debug!("Presentation changed to {presentation:?}");
                    self.presentation = presentation;
                }
                // The container is re-measured either way.
                self.resize.arm(now);
            }
            MindmapEvent::Control(control) => self.handle_control(control),
            MindmapEvent::Tick => self.tick(now),
            MindmapEvent::BeforeUnload => {
                if self.autosave.is_dirty() {
                    self.save(now);
                }
                self.autosave.stop();
            }
        }
    }

    fn apply_stroke_command(&mut self, command: StrokeCommand, now: Instant) {
        match command {
            StrokeCommand::Begin(point) => self.begin_stroke(point),
            StrokeCommand::Extend(point) => self.extend_stroke(point),
            StrokeCommand::End => self.end_stroke(now),
        }
    }

    fn handle_control(&mut self, control: Control) {
        match control {
            Control::SetColor(color) => self.tools.set_color(color),
            Control::SetInkWidth(width) => {
                self.tools.set_ink_width(width);
            }
            Control::SetEraserWidth(width) => {
                self.tools.set_eraser_width(width);
            }
            Control::ToggleEraser => {
                let mode = self.tools.toggle_eraser();
                log::debug!("Tool mode: {mode:?}");
            }
            Control::Clear => self.clear(),
            Control::ToggleFullscreen => self.toggle_fullscreen(),
            Control::Export => match self.snapshot() {
                Ok(snapshot) => self.notifications.push(Notification::ExportReady(snapshot)),
                Err(e) => {
                    log::error!("Failed to export mindmap: {e}");
                    self.notifications.push(Notification::ExportFailed(e.to_string()));
                }
            },
        }
    }

    fn tick(&mut self, now: Instant) {
        if self.resize.poll(now) {
            self.recover_from_resize();
        }
        if self.autosave.poll(now) {
            self.save(now);
        }
    }

    fn toggle_fullscreen(&mut self) {
        let result = if self.presentation.is_fullscreen() {
            self.host.exit_fullscreen()
        } else {
            self.host.request_fullscreen()
        };

        match result {
            Ok(()) => log::debug!("Fullscreen toggle requested"),
            Err(HostError::Unsupported(feature)) => {
                log::warn!("{feature} is not supported by the host");
                self.notifications.push(Notification::Unsupported(feature));
            }
            Err(e) => {
                log::warn!("Fullscreen request failed: {e}");
                self.notifications.push(Notification::Unsupported(e.to_string()));
            }
        }
    }

    /// Start a stroke at a logical point.
    pub fn begin_stroke(&mut self, point: Point) {
        self.renderer.begin(point);
    }

    /// Draw to a logical point with the active tool. Ignored when not drawing.
    pub fn extend_stroke(&mut self, point: Point) {
        let brush = self.tools.brush();
        if self.renderer.extend(&mut self.surface, &brush, point) {
            self.autosave.mark_dirty();
        }
    }

    /// Finish the stroke and save. A second call is a no-op.
    pub fn end_stroke(&mut self, now: Instant) {
        if self.renderer.end() {
            self.save(now);
        }
    }

    /// Encode the surface and write it to storage.
    ///
    /// Returns whether the write succeeded. Failures become notifications;
    /// the previously stored snapshot stays as it was.
    pub fn save(&mut self, now: Instant) -> bool {
        let result = Snapshot::capture(self.surface.pixmap())
            .map_err(|e| e.to_string())
            .and_then(|snapshot| {
                self.autosave
                    .save(&snapshot, now)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => {
                log::debug!("Mindmap saved under '{}'", self.autosave.key());
                self.notifications.push(Notification::Autosaved);
                true
            }
            Err(reason) => {
                log::error!("Failed to save mindmap: {reason}");
                self.notifications.push(Notification::SaveFailed(reason));
                false
            }
        }
    }

    /// Replace the surface with the stored snapshot, if there is one.
    ///
    /// Returns whether anything was restored. A snapshot that cannot be read
    /// or decoded leaves the surface untouched.
    pub fn load(&mut self) -> bool {
        let value = match self.autosave.load() {
            Ok(Some(value)) => value,
            Ok(None) => {
                log::debug!("No stored mindmap under '{}'", self.autosave.key());
                return false;
            }
            Err(e) => {
                log::error!("Failed to read stored mindmap: {e}");
                self.notifications.push(Notification::DecodeFailed(e.to_string()));
                return false;
            }
        };

        match Snapshot::from_data_url(&value).and_then(|snapshot| snapshot.decode()) {
            Ok(image) => {
                self.renderer.cancel();
                self.input.reset();
                self.surface.replace_with(&image);
                log::info!("Restored mindmap ({}x{})", image.width(), image.height());
                true
            }
            Err(e) => {
                log::error!("Failed to decode stored mindmap: {e}");
                self.notifications.push(Notification::DecodeFailed(e.to_string()));
                false
            }
        }
    }

    /// Blank the surface, drop the stored snapshot and return to ink.
    pub fn clear(&mut self) {
        self.renderer.cancel();
        self.input.reset();
        self.surface.clear();
        self.tools.reset_mode();

        if let Err(e) = self.autosave.clear() {
            log::error!("Failed to remove stored mindmap: {e}");
            self.notifications.push(Notification::ClearFailed(e.to_string()));
        } else {
            log::info!("Mindmap cleared");
        }
    }

    /// Encode the surface as it is right now.
    pub fn snapshot(&self) -> SnapshotResult<Snapshot> {
        Snapshot::capture(self.surface.pixmap())
    }

    /// Re-lay out for the current container, carrying the content over.
    ///
    /// The content goes through an encoded snapshot and is redrawn scaled to
    /// the new buffer. Nothing happens if the layout did not change.
    fn recover_from_resize(&mut self) {
        let config = match SurfaceConfig::compute(
            self.host.container_size(),
            self.host.device_pixel_ratio(),
            self.config.layout,
            self.config.max_dimension,
        ) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Keeping current layout: {e}");
                self.notifications.push(Notification::ResizeFailed(e.to_string()));
                return;
            }
        };

        if config == *self.surface.config() {
            log::debug!("Layout unchanged, skipping redraw");
            return;
        }

        let snapshot = match self.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log::error!("Failed to capture surface before resize: {e}");
                self.notifications.push(Notification::ResizeFailed(e.to_string()));
                return;
            }
        };

        if let Err(e) = self.surface.configure(config) {
            log::warn!("Keeping current layout: {e}");
            self.notifications.push(Notification::ResizeFailed(e.to_string()));
            return;
        }

        match snapshot.decode() {
            Ok(image) => self.surface.replace_with(&image),
            Err(e) => {
                log::error!("Failed to redraw after resize: {e}");
                self.notifications.push(Notification::DecodeFailed(e.to_string()));
            }
        }
    }

    /// Earliest instant at which a `Tick` would do something.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.resize.deadline(), self.autosave.next_fire()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// When the debounced resize will be applied, if one is pending.
    pub fn pending_resize(&self) -> Option<Instant> {
        self.resize.deadline()
    }

    /// Drain pending notifications, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn mode(&self) -> CompositeMode {
        self.tools.mode()
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn is_drawing(&self) -> bool {
        self.renderer.is_drawing()
    }

    /// Check if there are changes not yet written to storage.
    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    pub fn config(&self) -> &MindmapConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<S> {
        self.autosave.storage()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, e.g. to change the container size before
    /// sending `ContainerResized`.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
