//! Encoded surface snapshots (PNG, optionally wrapped in a data URL).

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use tiny_skia::{ColorU8, IntSize, Pixmap};

/// Prefix of the string form written to storage.
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Snapshot encode/decode errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed data URL: {0}")]
    DataUrl(String),
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("PNG decode failed: {0}")]
    Decode(#[from] png::DecodingError),
    #[error("PNG encode failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("Unsupported PNG layout: {0}")]
    Unsupported(String),
    #[error("Invalid image dimensions {width}x{height}")]
    Dimensions { width: u32, height: u32 },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// A full-surface PNG image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    png: Vec<u8>,
}

impl Snapshot {
    /// Encode the current contents of a pixel buffer.
    pub fn capture(pixmap: &Pixmap) -> SnapshotResult<Self> {
        Ok(Self {
            png: encode_png(pixmap)?,
        })
    }

    /// Wrap already-encoded PNG bytes. They are not validated until `decode`.
    pub fn from_png(png: Vec<u8>) -> Self {
        Self { png }
    }

    /// Parse the stored string form.
    ///
    /// Accepts a `data:image/...;base64,` URL or a bare base64 payload.
    pub fn from_data_url(value: &str) -> SnapshotResult<Self> {
        let value = value.trim();
        let payload = if let Some(rest) = value.strip_prefix("data:") {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| SnapshotError::DataUrl("missing ',' separator".to_string()))?;
            if !header.ends_with(";base64") {
                return Err(SnapshotError::DataUrl(format!(
                    "expected base64 encoding, got '{header}'"
                )));
            }
            payload
        } else {
            value
        };

        Ok(Self {
            png: STANDARD.decode(payload)?,
        })
    }

    /// String form for storage.
    pub fn to_data_url(&self) -> String {
        format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&self.png))
    }

    pub fn as_png(&self) -> &[u8] {
        &self.png
    }

    pub fn into_png(self) -> Vec<u8> {
        self.png
    }

    /// Decode into a premultiplied pixel buffer.
    pub fn decode(&self) -> SnapshotResult<Pixmap> {
        decode_png(&self.png)
    }
}

/// Encode a premultiplied pixel buffer as straight-alpha RGBA8 PNG.
pub fn encode_png(pixmap: &Pixmap) -> SnapshotResult<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, pixmap.width(), pixmap.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&rgba)?;
        writer.finish()?;
    }

    Ok(png_data)
}

/// Decode PNG bytes of any colour type into a premultiplied pixel buffer.
pub fn decode_png(bytes: &[u8]) -> SnapshotResult<Pixmap> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let data = &buf[..info.buffer_size()];

    if info.bit_depth != png::BitDepth::Eight {
        return Err(SnapshotError::Unsupported(format!(
            "bit depth {:?}",
            info.bit_depth
        )));
    }

    let channels = match info.color_type {
        png::ColorType::Rgba => 4,
        png::ColorType::Rgb => 3,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Grayscale => 1,
        other => {
            return Err(SnapshotError::Unsupported(format!("color type {other:?}")));
        }
    };

    let (width, height) = (info.width, info.height);
    let size = IntSize::from_wh(width, height).ok_or(SnapshotError::Dimensions { width, height })?;

    let mut premultiplied = Vec::with_capacity(width as usize * height as usize * 4);
    for px in data.chunks_exact(channels) {
        let color = match channels {
            4 => ColorU8::from_rgba(px[0], px[1], px[2], px[3]),
            3 => ColorU8::from_rgba(px[0], px[1], px[2], 255),
            2 => ColorU8::from_rgba(px[0], px[0], px[0], px[1]),
            _ => ColorU8::from_rgba(px[0], px[0], px[0], 255),
        }
        .premultiply();
        premultiplied.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    Pixmap::from_vec(premultiplied, size).ok_or(SnapshotError::Dimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pixmap() -> Pixmap {
        let mut pixmap = Pixmap::new(3, 2).unwrap();
        let pixels = pixmap.pixels_mut();
        pixels[0] = ColorU8::from_rgba(0, 0, 255, 255).premultiply();
        pixels[1] = ColorU8::from_rgba(0, 0, 255, 128).premultiply();
        pixels[4] = ColorU8::from_rgba(255, 0, 0, 1).premultiply();
        pixmap
    }

    #[test]
    fn test_png_roundtrip_is_lossless() {
        let pixmap = sample_pixmap();
        let snapshot = Snapshot::capture(&pixmap).unwrap();
        let decoded = snapshot.decode().unwrap();

        assert_eq!(decoded.width(), 3);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.data(), pixmap.data());
    }

    #[test]
    fn test_data_url_form() {
        let snapshot = Snapshot::capture(&sample_pixmap()).unwrap();
        let url = snapshot.to_data_url();
        assert!(url.starts_with(DATA_URL_PREFIX));

        let parsed = Snapshot::from_data_url(&url).unwrap();
        assert_eq!(parsed, snapshot);

        let bare = Snapshot::from_data_url(&url[DATA_URL_PREFIX.len()..]).unwrap();
        assert_eq!(bare, snapshot);
    }

    #[test]
    fn test_malformed_data_url() {
        assert!(matches!(
            Snapshot::from_data_url("data:image/png;base64"),
            Err(SnapshotError::DataUrl(_))
        ));
        assert!(matches!(
            Snapshot::from_data_url("data:text/plain,hello"),
            Err(SnapshotError::DataUrl(_))
        ));
        assert!(matches!(
            Snapshot::from_data_url("data:image/png;base64,@@@"),
            Err(SnapshotError::Base64(_))
        ));
    }

    #[test]
    fn test_corrupt_png_fails_to_decode() {
        let snapshot = Snapshot::from_png(b"definitely not a png".to_vec());
        assert!(matches!(snapshot.decode(), Err(SnapshotError::Decode(_))));

        let mut truncated = Snapshot::capture(&sample_pixmap()).unwrap().into_png();
        truncated.truncate(truncated.len() / 2);
        assert!(Snapshot::from_png(truncated).decode().is_err());
    }

    #[test]
    fn test_decode_rgb_png() {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, 2, 1);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[10, 20, 30, 40, 50, 60]).unwrap();
        }

        let pixmap = decode_png(&png_data).unwrap();
        let pixel = pixmap.pixel(1, 0).unwrap();
        assert_eq!(
            (pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()),
            (40, 50, 60, 255)
        );
    }

    #[test]
    fn test_decode_grayscale_png() {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, 1, 1);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[200]).unwrap();
        }

        let pixel = decode_png(&png_data).unwrap().pixel(0, 0).unwrap();
        assert_eq!((pixel.red(), pixel.blue(), pixel.alpha()), (200, 200, 255));
    }
}
