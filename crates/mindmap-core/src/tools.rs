//! Tool state: ink vs. eraser, colour, per-tool widths, and presentation.

use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default ink stroke width in logical pixels.
pub const DEFAULT_INK_WIDTH: f64 = 2.0;

/// Default eraser stroke width in logical pixels.
pub const DEFAULT_ERASER_WIDTH: f64 = 10.0;

/// How a stroke combines with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    /// Opaque colour painted over the destination.
    #[default]
    Ink,
    /// Punches the destination alpha out along the stroke.
    Erase,
}

/// Opaque RGB colour, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid color '{0}', expected #rrggbb")]
pub struct ParseColorError(pub String);

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or the short `#rgb` form.
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !hex.is_ascii() {
            return Err(err());
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);

        match hex.len() {
            6 => Ok(Self::new(
                channel(0..2).map_err(|_| err())?,
                channel(2..4).map_err(|_| err())?,
                channel(4..6).map_err(|_| err())?,
            )),
            3 => {
                let short = |i: usize| channel(i..i + 1).map(|v| v * 17).map_err(|_| err());
                Ok(Self::new(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(err()),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::BLACK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

impl From<Rgb> for Color {
    fn from(color: Rgb) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, 255)
    }
}

impl From<Color> for Rgb {
    /// Drops alpha; ink is always opaque.
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Rgb::new(rgba.r, rgba.g, rgba.b)
    }
}

/// Everything the renderer needs for one segment.
#[derive(Debug, Clone, Copy)]
pub struct Brush {
    pub mode: CompositeMode,
    /// Ignored in erase mode.
    pub color: Color,
    /// Logical pixels.
    pub width: f64,
}

/// Active tool and the remembered settings of both tools.
///
/// Ink and eraser settings are kept apart so that switching tools never
/// leaks one tool's width into the other.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    mode: CompositeMode,
    color: Rgb,
    ink_width: f64,
    eraser_width: f64,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            mode: CompositeMode::Ink,
            color: Rgb::BLACK,
            ink_width: DEFAULT_INK_WIDTH,
            eraser_width: DEFAULT_ERASER_WIDTH,
        }
    }
}

impl ToolState {
    /// Create a tool state in ink mode. Invalid widths fall back to the defaults.
    pub fn new(color: Rgb, ink_width: f64, eraser_width: f64) -> Self {
        let mut tools = Self {
            color,
            ..Self::default()
        };
        tools.set_ink_width(ink_width);
        tools.set_eraser_width(eraser_width);
        tools
    }

    pub fn mode(&self) -> CompositeMode {
        self.mode
    }

    pub fn is_erasing(&self) -> bool {
        self.mode == CompositeMode::Erase
    }

    /// Ink colour (kept while erasing).
    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn ink_width(&self) -> f64 {
        self.ink_width
    }

    pub fn eraser_width(&self) -> f64 {
        self.eraser_width
    }

    /// Width of the tool that will draw the next stroke.
    pub fn active_width(&self) -> f64 {
        match self.mode {
            CompositeMode::Ink => self.ink_width,
            CompositeMode::Erase => self.eraser_width,
        }
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.color = color;
    }

    /// Set the ink width. Returns false (and keeps the old width) if not a positive number.
    pub fn set_ink_width(&mut self, width: f64) -> bool {
        match valid_width(width) {
            Some(width) => {
                self.ink_width = width;
                true
            }
            None => false,
        }
    }

    /// Set the eraser width. Returns false (and keeps the old width) if not a positive number.
    pub fn set_eraser_width(&mut self, width: f64) -> bool {
        match valid_width(width) {
            Some(width) => {
                self.eraser_width = width;
                true
            }
            None => false,
        }
    }

    pub fn set_mode(&mut self, mode: CompositeMode) {
        self.mode = mode;
    }

    /// Flip between ink and eraser, returning the new mode.
    pub fn toggle_eraser(&mut self) -> CompositeMode {
        self.mode = match self.mode {
            CompositeMode::Ink => CompositeMode::Erase,
            CompositeMode::Erase => CompositeMode::Ink,
        };
        self.mode
    }

    /// Back to ink, keeping colour and widths.
    pub fn reset_mode(&mut self) {
        self.mode = CompositeMode::Ink;
    }

    /// Brush for the next segment.
    pub fn brush(&self) -> Brush {
        Brush {
            mode: self.mode,
            color: self.color.into(),
            width: self.active_width(),
        }
    }
}

fn valid_width(width: f64) -> Option<f64> {
    if width.is_finite() && width > 0.0 {
        Some(width)
    } else {
        log::warn!("Ignoring invalid stroke width {width}");
        None
    }
}

/// Whether the surface is shown inline or fullscreen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    #[default]
    Normal,
    Fullscreen,
}

impl Presentation {
    pub fn from_fullscreen(active: bool) -> Self {
        if active {
            Presentation::Fullscreen
        } else {
            Presentation::Normal
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        *self == Presentation::Fullscreen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgb::from_hex("#0000FF").unwrap(), Rgb::new(0, 0, 255));
        assert_eq!(Rgb::from_hex("#ff8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::from_hex(" #f0a ").unwrap(), Rgb::new(255, 0, 170));
        assert!(Rgb::from_hex("0000ff").is_err());
        assert!(Rgb::from_hex("#00ff").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
        assert!(Rgb::from_hex("#ééé").is_err());
    }

    #[test]
    fn test_hex_roundtrip_through_serde() {
        let color = Rgb::new(18, 52, 86);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#123456\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, color);
        assert!(serde_json::from_str::<Rgb>("\"blue\"").is_err());
    }

    #[test]
    fn test_peniko_conversion_is_opaque() {
        let color: Color = Rgb::new(1, 2, 3).into();
        let rgba = color.to_rgba8();
        assert_eq!((rgba.r, rgba.g, rgba.b, rgba.a), (1, 2, 3, 255));
        assert_eq!(Rgb::from(Color::from_rgba8(9, 8, 7, 10)), Rgb::new(9, 8, 7));
    }

    #[test]
    fn test_toggle_eraser_swaps_width() {
        let mut tools = ToolState::new(Rgb::new(0, 0, 255), 4.0, 20.0);
        assert_eq!(tools.active_width(), 4.0);

        assert_eq!(tools.toggle_eraser(), CompositeMode::Erase);
        assert_eq!(tools.active_width(), 20.0);
        assert_eq!(tools.brush().mode, CompositeMode::Erase);

        assert_eq!(tools.toggle_eraser(), CompositeMode::Ink);
        assert_eq!(tools.active_width(), 4.0);
        assert_eq!(tools.color(), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_settings_do_not_leak_between_tools() {
        let mut tools = ToolState::default();
        tools.toggle_eraser();
        tools.set_color(Rgb::new(255, 0, 0));
        tools.set_ink_width(7.0);
        assert_eq!(tools.active_width(), DEFAULT_ERASER_WIDTH);

        tools.toggle_eraser();
        tools.set_eraser_width(30.0);
        let brush = tools.brush();
        assert_eq!(brush.width, 7.0);
        assert_eq!(Rgb::from(brush.color), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_invalid_width_rejected() {
        let mut tools = ToolState::default();
        assert!(!tools.set_ink_width(0.0));
        assert!(!tools.set_ink_width(-3.0));
        assert!(!tools.set_eraser_width(f64::NAN));
        assert_eq!(tools.ink_width(), DEFAULT_INK_WIDTH);
        assert_eq!(tools.eraser_width(), DEFAULT_ERASER_WIDTH);

        let tools = ToolState::new(Rgb::BLACK, -1.0, 15.0);
        assert_eq!(tools.ink_width(), DEFAULT_INK_WIDTH);
        assert_eq!(tools.eraser_width(), 15.0);
    }

    #[test]
    fn test_reset_mode() {
        let mut tools = ToolState::default();
        tools.toggle_eraser();
        tools.reset_mode();
        assert!(!tools.is_erasing());
    }

    #[test]
    fn test_presentation() {
        assert!(Presentation::from_fullscreen(true).is_fullscreen());
        assert_eq!(Presentation::default(), Presentation::Normal);
    }
}
