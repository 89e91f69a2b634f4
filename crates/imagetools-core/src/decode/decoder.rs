//! Built-in raster decoding with EXIF orientation handling.
//!
//! JPEG, PNG, WebP and GIF (first frame) are decoded in-process with the
//! `image` crate. Everything is converted to RGBA8 and rotated upright
//! according to the EXIF orientation tag, matching what a browser `<img>`
//! shows.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageReader};
use tracing::debug;

use super::{DecodeError, InputFormat, Orientation, SourceImage};
use crate::bitmap::Bitmap;
use crate::config::PipelineConfig;

/// Decode an image from bytes, applying EXIF orientation correction.
///
/// # Arguments
///
/// * `bytes` - Raw file bytes
/// * `hint` - Declared content type (MIME type or file name), used when the
///   magic bytes are not recognized
/// * `config` - Supplies the decode size limits
///
/// # Errors
///
/// Returns `DecodeError::Empty` for an empty buffer,
/// `DecodeError::Unsupported` for formats without a built-in decoder,
/// `DecodeError::TooLarge` above the configured limits and
/// `DecodeError::Corrupted` when the bytes are truncated or damaged.
pub fn decode_image(
    bytes: &[u8],
    hint: Option<&str>,
    config: &PipelineConfig,
) -> Result<SourceImage, DecodeError> {
    let format = InputFormat::detect(bytes, hint);
    if bytes.is_empty() {
        return Err(DecodeError::Empty { format });
    }

    let image_format = format
        .image_format()
        .ok_or(DecodeError::Unsupported { format })?;

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), image_format)
        .into_dimensions()
        .map_err(|e| map_image_error(format, e))?;
    check_limits(format, width, height, config)?;

    let img = ImageReader::with_format(Cursor::new(bytes), image_format)
        .decode()
        .map_err(|e| map_image_error(format, e))?;

    let orientation = extract_orientation(bytes);
    let oriented = apply_orientation(img, orientation);

    let bitmap = Bitmap::try_from(oriented.into_rgba8()).map_err(|e| DecodeError::Corrupted {
        format,
        message: e.to_string(),
    })?;

    debug!(
        %format,
        width = bitmap.width(),
        height = bitmap.height(),
        ?orientation,
        "decoded image"
    );
    Ok(SourceImage::new(bitmap, format))
}

/// Reject images whose dimensions exceed the configured limits.
pub(crate) fn check_limits(
    format: InputFormat,
    width: u32,
    height: u32,
    config: &PipelineConfig,
) -> Result<(), DecodeError> {
    let pixels = width as u64 * height as u64;
    if pixels > config.max_pixels
        || width > config.max_dimension
        || height > config.max_dimension
    {
        return Err(DecodeError::TooLarge {
            format,
            width,
            height,
            max_pixels: config.max_pixels,
        });
    }
    Ok(())
}

fn map_image_error(format: InputFormat, err: image::ImageError) -> DecodeError {
    match err {
        image::ImageError::Unsupported(_) => DecodeError::Unsupported { format },
        other => DecodeError::Corrupted {
            format,
            message: other.to_string(),
        },
    }
}

/// Extract the EXIF orientation value from image bytes.
///
/// Missing or unreadable EXIF data yields `Orientation::Normal`.
pub fn extract_orientation(bytes: &[u8]) -> Orientation {
    let mut cursor = Cursor::new(bytes);
    match Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Orientation::from)
            .unwrap_or_default(),
        Err(_) => Orientation::Normal,
    }
}

/// Apply EXIF orientation transformation to an image.
fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    }
}
