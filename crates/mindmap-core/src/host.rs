//! Boundary to the element hosting the surface.

use kurbo::{Point, Size};
use thiserror::Error;

/// Host capability errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("{0}")]
    Unsupported(String),
    #[error("Host rejected the request: {0}")]
    Rejected(String),
}

/// The element the surface lives in.
///
/// Sizes are queried fresh whenever they are needed (startup, every applied
/// resize, fullscreen transitions); nothing is cached on the core side.
pub trait Host {
    /// Current logical size of the container.
    fn container_size(&self) -> Size;

    /// Device pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f64 {
        1.0
    }

    /// Page-space position of the container's top-left corner.
    fn container_origin(&self) -> Point {
        Point::ZERO
    }

    /// Ask the host to show the container fullscreen.
    ///
    /// Success only means the request was accepted; the transition itself is
    /// reported later as `MindmapEvent::FullscreenChanged`.
    fn request_fullscreen(&mut self) -> Result<(), HostError> {
        Err(HostError::Unsupported("Fullscreen".to_string()))
    }

    /// Ask the host to leave fullscreen.
    fn exit_fullscreen(&mut self) -> Result<(), HostError> {
        Err(HostError::Unsupported("Fullscreen".to_string()))
    }
}

/// A host with no real window, for tests and offline sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessHost {
    pub size: Size,
    pub device_pixel_ratio: f64,
    pub origin: Point,
    /// Container size while fullscreen; `None` means fullscreen is unsupported.
    pub fullscreen_size: Option<Size>,
    fullscreen: bool,
}

impl HeadlessHost {
    pub fn new(size: Size, device_pixel_ratio: f64) -> Self {
        Self {
            size,
            device_pixel_ratio,
            origin: Point::ZERO,
            fullscreen_size: None,
            fullscreen: false,
        }
    }

    /// Support fullscreen with the given screen size.
    pub fn with_fullscreen(mut self, screen: Size) -> Self {
        self.fullscreen_size = Some(screen);
        self
    }

    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }
}

impl Host for HeadlessHost {
    fn container_size(&self) -> Size {
        match (self.fullscreen, self.fullscreen_size) {
            (true, Some(screen)) => screen,
            _ => self.size,
        }
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn container_origin(&self) -> Point {
        if self.fullscreen { Point::ZERO } else { self.origin }
    }

    fn request_fullscreen(&mut self) -> Result<(), HostError> {
        if self.fullscreen_size.is_none() {
            return Err(HostError::Unsupported("Fullscreen".to_string()));
        }
        self.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), HostError> {
        if self.fullscreen_size.is_none() {
            return Err(HostError::Unsupported("Fullscreen".to_string()));
        }
        self.fullscreen = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_without_fullscreen() {
        let mut host = HeadlessHost::new(Size::new(800.0, 450.0), 2.0);
        assert_eq!(host.container_size(), Size::new(800.0, 450.0));
        assert!(matches!(host.request_fullscreen(), Err(HostError::Unsupported(_))));
        assert!(!host.is_fullscreen());
    }

    #[test]
    fn test_headless_fullscreen_changes_size_and_origin() {
        let mut host = HeadlessHost::new(Size::new(800.0, 450.0), 1.0)
            .with_fullscreen(Size::new(1920.0, 1080.0))
            .with_origin(Point::new(40.0, 120.0));
        assert_eq!(host.container_origin(), Point::new(40.0, 120.0));

        host.request_fullscreen().unwrap();
        assert_eq!(host.container_size(), Size::new(1920.0, 1080.0));
        assert_eq!(host.container_origin(), Point::ZERO);

        host.exit_fullscreen().unwrap();
        assert_eq!(host.container_size(), Size::new(800.0, 450.0));
    }
}
