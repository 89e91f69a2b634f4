use std::io::Cursor;

use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::EncodeError;
use crate::bitmap::Bitmap;

/// Encode a bitmap to WebP bytes.
///
/// The `image` crate only ships a lossless WebP encoder, so quality has no
/// effect and alpha is preserved exactly.
pub fn encode_webp(bitmap: &Bitmap) -> Result<Vec<u8>, EncodeError> {
    let mut buffer = Cursor::new(Vec::new());
    WebPEncoder::new_lossless(&mut buffer)
        .write_image(
            bitmap.pixels(),
            bitmap.width(),
            bitmap.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    Ok(buffer.into_inner())
}
