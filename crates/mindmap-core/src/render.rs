//! Stroke rasterization.
//!
//! A stroke is drawn segment by segment as the pointer moves: each new point
//! is joined to the previous one with a round-capped line and the result is
//! composited straight into the surface. Nothing about the stroke survives
//! except its pixels.

use crate::surface::Surface;
use crate::tools::{Brush, CompositeMode};
use kurbo::Point;
use tiny_skia::{BlendMode, LineCap, LineJoin, Paint, PathBuilder, Stroke};

impl CompositeMode {
    /// Canvas composite operation for this mode.
    pub fn blend_mode(self) -> BlendMode {
        match self {
            CompositeMode::Ink => BlendMode::SourceOver,
            CompositeMode::Erase => BlendMode::DestinationOut,
        }
    }
}

/// State of the stroke in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StrokeState {
    /// Not drawing; moves are ignored.
    #[default]
    Idle,
    /// Drawing; the next segment starts at `anchor` (logical pixels).
    Drawing { anchor: Point },
}

/// Drives the begin/extend/end stroke protocol.
#[derive(Debug, Clone, Default)]
pub struct StrokeRenderer {
    state: StrokeState,
    /// Segments drawn in the current stroke.
    segments: usize,
}

impl StrokeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StrokeState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, StrokeState::Drawing { .. })
    }

    /// Current anchor, if drawing.
    pub fn anchor(&self) -> Option<Point> {
        match self.state {
            StrokeState::Drawing { anchor } => Some(anchor),
            StrokeState::Idle => None,
        }
    }

    /// Segments drawn since the stroke began.
    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Start a stroke at `point`. A stroke already in progress is restarted from here.
    pub fn begin(&mut self, point: Point) {
        self.state = StrokeState::Drawing { anchor: point };
        self.segments = 0;
    }

    /// Draw from the anchor to `point` and move the anchor.
    ///
    /// Returns false without touching the surface when no stroke is in progress.
    pub fn extend(&mut self, surface: &mut Surface, brush: &Brush, point: Point) -> bool {
        let StrokeState::Drawing { anchor } = self.state else {
            return false;
        };

        draw_segment(surface, brush, anchor, point);
        self.state = StrokeState::Drawing { anchor: point };
        self.segments += 1;
        true
    }

    /// Finish the stroke. Returns true only if a stroke was actually in progress,
    /// so a duplicate end (pointer up followed by pointer leave) is a no-op.
    pub fn end(&mut self) -> bool {
        if !self.is_drawing() {
            return false;
        }
        log::debug!("Stroke finished after {} segments", self.segments);
        self.state = StrokeState::Idle;
        true
    }

    /// Drop the stroke in progress without reporting it as finished.
    pub fn cancel(&mut self) {
        self.state = StrokeState::Idle;
        self.segments = 0;
    }
}

/// Rasterize one round-capped segment in logical coordinates.
pub fn draw_segment(surface: &mut Surface, brush: &Brush, from: Point, to: Point) {
    let mut pb = PathBuilder::new();
    pb.move_to(from.x as f32, from.y as f32);
    pb.line_to(to.x as f32, to.y as f32);
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint {
        anti_alias: true,
        blend_mode: brush.mode.blend_mode(),
        ..Default::default()
    };
    match brush.mode {
        CompositeMode::Ink => {
            let rgba = brush.color.to_rgba8();
            paint.set_color_rgba8(rgba.r, rgba.g, rgba.b, 255);
        }
        // Only source alpha matters for destination-out.
        CompositeMode::Erase => paint.set_color_rgba8(0, 0, 0, 255),
    }

    let stroke = Stroke {
        width: brush.width as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };

    let transform = surface.config().raster_transform();
    surface
        .pixmap_mut()
        .stroke_path(&path, &paint, &stroke, transform, None);
}
