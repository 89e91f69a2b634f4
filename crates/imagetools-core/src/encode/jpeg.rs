//! JPEG encoding for export.
//!
//! JPEG has no alpha channel, so transparent pixels are flattened onto a
//! background color first (white by default, like a canvas export).

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::EncodeError;
use crate::bitmap::{Bitmap, CHANNELS};
use crate::color::Rgb;
use crate::compose::flatten;

/// Encode a bitmap to JPEG bytes.
///
/// # Arguments
///
/// * `bitmap` - Source pixels; alpha is flattened onto `background`
/// * `quality` - JPEG quality (1-100, where 100 is highest quality); clamped
/// * `background` - Color that shows through transparent pixels
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 60-80: Medium quality, acceptable for web/social media
/// * Below 60: Low quality, visible artifacts
pub fn encode_jpeg(bitmap: &Bitmap, quality: u8, background: Rgb) -> Result<Vec<u8>, EncodeError> {
    let quality = quality.clamp(1, 100);

    let rgb = if bitmap.has_transparency() {
        strip_alpha(&flatten(bitmap, background))
    } else {
        strip_alpha(bitmap)
    };

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(&rgb, bitmap.width(), bitmap.height(), ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

fn strip_alpha(bitmap: &Bitmap) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(bitmap.pixel_count() * 3);
    for px in bitmap.pixels().chunks_exact(CHANNELS) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for generating valid image dimensions.
    fn dimensions_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=64, 1u32..=64)
    }

    proptest! {
        /// Property: any bitmap and quality produce a well-formed JPEG.
        #[test]
        fn prop_valid_input_produces_valid_jpeg(
            (width, height) in dimensions_strategy(),
            quality in 0u8..=255,
            rgba: [u8; 4],
        ) {
            let img = Bitmap::filled(width, height, rgba);
            let bytes = encode_jpeg(&img, quality, Rgb::WHITE).unwrap();

            prop_assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
            prop_assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
        }

        /// Property: encoding is deterministic.
        #[test]
        fn prop_deterministic_output(
            (width, height) in dimensions_strategy(),
            quality in 1u8..=100,
        ) {
            let img = Bitmap::filled(width, height, [200, 100, 50, 255]);
            let a = encode_jpeg(&img, quality, Rgb::WHITE).unwrap();
            let b = encode_jpeg(&img, quality, Rgb::WHITE).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
