//! Raster surface and logical-to-device coordinate mapping.
//!
//! Input arrives in logical (CSS) pixels. The backing buffer is addressed in
//! device pixels, `ceil(logical * scale_factor)` along each axis, and every draw
//! goes through a pre-scale transform so callers never multiply by the scale
//! factor themselves.

use kurbo::{Affine, Point, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_skia::{BlendMode, FilterQuality, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

/// Largest buffer edge we allocate (same as Chrome's canvas limit).
pub const MAX_DIMENSION: u32 = 32767;

/// Landscape ratio used by the fixed-aspect integrations.
pub const DEFAULT_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// How the surface's logical size is derived from its container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutPolicy {
    /// Use the container's width and height as-is.
    #[default]
    Fill,
    /// Use the container's width; height is `width / ratio`.
    FixedAspect { ratio: f64 },
}

impl LayoutPolicy {
    /// Landscape 16:9 fixed-aspect policy.
    pub fn landscape() -> Self {
        LayoutPolicy::FixedAspect {
            ratio: DEFAULT_ASPECT_RATIO,
        }
    }

    /// Logical surface size for a container of the given logical size.
    pub fn logical_size(&self, container: Size) -> Size {
        let width = sanitize_length(container.width);
        let height = sanitize_length(container.height);
        match *self {
            LayoutPolicy::Fill => Size::new(width, height),
            LayoutPolicy::FixedAspect { ratio } if ratio.is_finite() && ratio > 0.0 => {
                Size::new(width, width / ratio)
            }
            LayoutPolicy::FixedAspect { ratio } => {
                log::warn!("Ignoring invalid aspect ratio {ratio}, filling container");
                Size::new(width, height)
            }
        }
    }
}

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Surface too large: {width}x{height} device pixels (max {max})")]
    TooLarge { width: u32, height: u32, max: u32 },
    #[error("Failed to allocate {width}x{height} pixel buffer")]
    Allocation { width: u32, height: u32 },
}

/// Result of laying out the surface for a container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConfig {
    /// Presentation size in logical pixels.
    pub logical_size: Size,
    /// Device pixels per logical pixel.
    pub scale_factor: f64,
    /// Buffer width in device pixels.
    pub device_width: u32,
    /// Buffer height in device pixels.
    pub device_height: u32,
}

impl SurfaceConfig {
    /// Lay out a surface for a container.
    ///
    /// A missing or nonsensical device pixel ratio falls back to 1.
    pub fn compute(
        container: Size,
        device_pixel_ratio: f64,
        policy: LayoutPolicy,
        max_dimension: u32,
    ) -> Result<Self, SurfaceError> {
        let scale_factor = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            log::debug!("Invalid device pixel ratio {device_pixel_ratio}, using 1.0");
            1.0
        };

        let logical_size = policy.logical_size(container);
        let device_width = device_length(logical_size.width, scale_factor);
        let device_height = device_length(logical_size.height, scale_factor);

        if device_width > max_dimension || device_height > max_dimension {
            return Err(SurfaceError::TooLarge {
                width: device_width,
                height: device_height,
                max: max_dimension,
            });
        }

        Ok(Self {
            logical_size,
            scale_factor,
            device_width,
            device_height,
        })
    }

    /// Logical-to-device transform.
    pub fn transform(&self) -> Affine {
        Affine::scale(self.scale_factor)
    }

    /// Map a logical point into device space.
    pub fn logical_to_device(&self, point: Point) -> Point {
        self.transform() * point
    }

    /// Map a device point back into logical space.
    pub fn device_to_logical(&self, point: Point) -> Point {
        self.transform().inverse() * point
    }

    /// The logical-to-device transform in rasterizer form.
    pub fn raster_transform(&self) -> Transform {
        let [a, b, c, d, e, f] = self.transform().as_coeffs();
        Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
    }
}

fn sanitize_length(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

/// `ceil(logical * scale)`, tolerant of float noise like `0.1 * 3.0`.
/// A zero-sized container still gets a single device pixel.
fn device_length(logical: f64, scale: f64) -> u32 {
    let raw = logical * scale;
    let rounded = raw.round();
    let length = if (raw - rounded).abs() < 1e-6 {
        rounded
    } else {
        raw.ceil()
    };
    length.clamp(1.0, u32::MAX as f64) as u32
}

/// The raster buffer strokes are drawn into.
#[derive(Debug, Clone)]
pub struct Surface {
    config: SurfaceConfig,
    pixmap: Pixmap,
}

impl Surface {
    /// Allocate a blank surface.
    pub fn new(config: SurfaceConfig) -> Result<Self, SurfaceError> {
        let pixmap = allocate(&config)?;
        Ok(Self { config, pixmap })
    }

    /// Replace the buffer with a blank one laid out for `config`.
    ///
    /// Content is not carried over; see the resize recovery in `Mindmap`.
    pub fn configure(&mut self, config: SurfaceConfig) -> Result<(), SurfaceError> {
        self.pixmap = allocate(&config)?;
        self.config = config;
        log::debug!(
            "Surface configured: {}x{} logical, {}x{} device @ {}",
            self.config.logical_size.width,
            self.config.logical_size.height,
            self.config.device_width,
            self.config.device_height,
            self.config.scale_factor
        );
        Ok(())
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// The device-pixel buffer (premultiplied RGBA).
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Pixel at device coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> Option<PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    /// Make every pixel fully transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Check if nothing has been drawn (every pixel fully transparent).
    pub fn is_blank(&self) -> bool {
        self.pixmap.pixels().iter().all(|p| p.alpha() == 0)
    }

    /// Number of pixels with any coverage.
    pub fn painted_pixels(&self) -> usize {
        self.pixmap.pixels().iter().filter(|p| p.alpha() > 0).count()
    }

    /// Draw-replace the whole surface with `image`, stretched to fill it.
    ///
    /// Same-sized images are copied verbatim so a save/load cycle is lossless.
    pub fn replace_with(&mut self, image: &Pixmap) {
        if image.width() == self.pixmap.width() && image.height() == self.pixmap.height() {
            self.pixmap.data_mut().copy_from_slice(image.data());
            return;
        }

        self.clear();
        let sx = self.pixmap.width() as f32 / image.width() as f32;
        let sy = self.pixmap.height() as f32 / image.height() as f32;
        let paint = PixmapPaint {
            opacity: 1.0,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            Transform::from_scale(sx, sy),
            None,
        );
    }
}

fn allocate(config: &SurfaceConfig) -> Result<Pixmap, SurfaceError> {
    Pixmap::new(config.device_width, config.device_height).ok_or(SurfaceError::Allocation {
        width: config.device_width,
        height: config.device_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(width: f64, height: f64, dpr: f64) -> SurfaceConfig {
        SurfaceConfig::compute(Size::new(width, height), dpr, LayoutPolicy::Fill, MAX_DIMENSION)
            .unwrap()
    }

    #[test]
    fn test_fill_policy_device_size() {
        let config = config(800.0, 450.0, 2.0);
        assert_eq!(config.device_width, 1600);
        assert_eq!(config.device_height, 900);
        assert_eq!(config.logical_size, Size::new(800.0, 450.0));
    }

    #[test]
    fn test_fractional_ratio_rounds_up() {
        let config = config(101.0, 33.0, 1.5);
        assert_eq!(config.device_width, 152); // 151.5
        assert_eq!(config.device_height, 50); // 49.5
    }

    #[test]
    fn test_float_noise_does_not_round_up() {
        let config = config(0.1, 10.0, 30.0);
        assert_eq!(config.device_width, 3);
    }

    #[test]
    fn test_fixed_aspect_policy() {
        let config = SurfaceConfig::compute(
            Size::new(1600.0, 200.0),
            1.0,
            LayoutPolicy::landscape(),
            MAX_DIMENSION,
        )
        .unwrap();
        assert!((config.logical_size.width - 1600.0).abs() < 1e-9);
        assert!((config.logical_size.height - 900.0).abs() < 1e-9);
        assert_eq!(config.device_height, 900);
    }

    #[test]
    fn test_invalid_dpr_falls_back_to_one() {
        for dpr in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            let config = config(100.0, 50.0, dpr);
            assert!((config.scale_factor - 1.0).abs() < f64::EPSILON);
            assert_eq!(config.device_width, 100);
        }
    }

    #[test]
    fn test_zero_container_gets_one_pixel() {
        let config = config(0.0, 0.0, 2.0);
        assert_eq!((config.device_width, config.device_height), (1, 1));
        assert!(Surface::new(config).is_ok());
    }

    #[test]
    fn test_too_large() {
        let result = SurfaceConfig::compute(Size::new(20_000.0, 100.0), 2.0, LayoutPolicy::Fill, MAX_DIMENSION);
        assert!(matches!(result, Err(SurfaceError::TooLarge { width: 40_000, .. })));
    }

    #[test]
    fn test_coordinate_mapping_roundtrip() {
        let config = config(800.0, 450.0, 2.0);
        let device = config.logical_to_device(Point::new(10.0, 200.0));
        assert!((device.x - 20.0).abs() < 1e-10);
        assert!((device.y - 400.0).abs() < 1e-10);

        let back = config.device_to_logical(device);
        assert!((back.x - 10.0).abs() < 1e-10);
        assert!((back.y - 200.0).abs() < 1e-10);
    }

    #[test]
    fn test_configure_is_idempotent_for_same_input() {
        let a = config(320.0, 240.0, 1.25);
        let b = config(320.0, 240.0, 1.25);
        assert_eq!(a, b);

        let mut surface = Surface::new(a).unwrap();
        surface.configure(b).unwrap();
        assert_eq!(surface.width(), 400);
        assert_eq!(surface.height(), 300);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_replace_with_same_size_is_exact() {
        let mut source = Pixmap::new(4, 4).unwrap();
        source.fill(tiny_skia::Color::from_rgba8(0, 0, 255, 255));

        let mut surface = Surface::new(config(4.0, 4.0, 1.0)).unwrap();
        surface.replace_with(&source);
        assert_eq!(surface.pixmap().data(), source.data());
    }

    #[test]
    fn test_replace_with_stretches_to_fill() {
        let mut source = Pixmap::new(10, 10).unwrap();
        source.fill(tiny_skia::Color::from_rgba8(255, 0, 0, 255));

        let mut surface = Surface::new(config(40.0, 20.0, 1.0)).unwrap();
        surface.replace_with(&source);

        let center = surface.pixel(20, 10).unwrap();
        assert_eq!(center.alpha(), 255);
        assert_eq!(center.red(), 255);
        assert!(surface.pixel(1, 1).unwrap().alpha() > 0);
        assert!(surface.pixel(38, 18).unwrap().alpha() > 0);
    }

    #[test]
    fn test_clear() {
        let mut surface = Surface::new(config(8.0, 8.0, 1.0)).unwrap();
        surface.pixmap_mut().fill(tiny_skia::Color::BLACK);
        assert_eq!(surface.painted_pixels(), 64);

        surface.clear();
        assert!(surface.is_blank());
    }
}
