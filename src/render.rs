//! Decoding the upload, painting the redaction boxes and re-encoding the result
//! in the format it arrived in.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::error::{RedactError, Result};
use crate::words::PixelRect;

/// Base name used when the upload carries no usable filename.
pub const DEFAULT_BASE_NAME: &str = "masked_image";

const MASKED_SUFFIX: &str = "_masked";
const JPEG_QUALITY: u8 = 95;

/// Extra pixels painted around every box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub x_offset: u32,
    pub y_offset: u32,
}

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    if bytes.is_empty() {
        return Err(RedactError::EmptyImage);
    }
    let format = image::guess_format(bytes)?;
    let image = image::load_from_memory_with_format(bytes, format)?;
    Ok(DecodedImage { image, format })
}

/// The format the redacted image is written in: the input's own format, or PNG
/// when that format cannot be written.
pub fn output_format(input: Option<ImageFormat>) -> ImageFormat {
    match input {
        Some(format) if format.writing_enabled() => format,
        _ => ImageFormat::Png,
    }
}

/// Paints every face box, then every word box, solid black. Returns the number
/// of rectangles that landed inside the image.
pub fn paint(
    surface: &mut DynamicImage,
    faces: &[PixelRect],
    words: impl IntoIterator<Item = PixelRect>,
    options: &RenderOptions,
) -> usize {
    let (width, height) = (surface.width(), surface.height());
    let black = Rgba([0, 0, 0, 255]);
    let mut painted = 0;

    for rect in faces.iter().copied().chain(words) {
        if rect.is_empty() {
            continue;
        }
        let Some(r) = rect.padded_within(options.x_offset, options.y_offset, width, height) else {
            continue;
        };
        draw_filled_rect_mut(surface, Rect::at(r.x, r.y).of_size(r.width, r.height), black);
        painted += 1;
    }
    painted
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let written = match format {
        ImageFormat::Jpeg => {
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))
        }
        _ => image.write_to(&mut buf, format),
    };
    written.map_err(|source| RedactError::Encode { format, source })?;
    Ok(buf.into_inner())
}

/// `<base>_masked.<ext>`, where `base` is the original filename without its
/// directory and last extension. `ext` is the upload's own extension when it
/// names the output format, otherwise the format's primary extension.
pub fn masked_filename(original: Option<&str>, format: ImageFormat) -> String {
    let name = original
        .map(|name| name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name));
    let (stem, own_ext) = match name.and_then(|n| n.rsplit_once('.')) {
        Some((stem, ext)) => (Some(stem), Some(ext)),
        None => (name, None),
    };
    let base = stem
        .map(str::trim)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(DEFAULT_BASE_NAME);
    let known = format.extensions_str();
    let ext = own_ext
        .filter(|ext| known.iter().any(|k| k.eq_ignore_ascii_case(ext)))
        .or_else(|| known.first().copied())
        .unwrap_or("png");
    format!("{base}{MASKED_SUFFIX}.{ext}")
}

/// A finished redaction ready to be written or streamed.
#[derive(Debug, Clone)]
pub struct RedactedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub filename: String,
}

impl RedactedImage {
    pub fn media_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}
