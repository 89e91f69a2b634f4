use super::EncodeError;
use crate::bitmap::Bitmap;

/// Encoder speed, 1 (slowest) to 10 (fastest).
#[cfg(feature = "avif")]
const AVIF_SPEED: u8 = 8;

/// Encode a bitmap to AVIF bytes.
#[cfg(feature = "avif")]
pub fn encode_avif(bitmap: &Bitmap, quality: u8) -> Result<Vec<u8>, EncodeError> {
    use image::codecs::avif::AvifEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    let mut buffer = Vec::new();
    AvifEncoder::new_with_speed_quality(&mut buffer, AVIF_SPEED, quality.clamp(1, 100))
        .write_image(
            bitmap.pixels(),
            bitmap.width(),
            bitmap.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;
    Ok(buffer)
}

/// AVIF is unavailable without the `avif` feature; never substitute another
/// format.
#[cfg(not(feature = "avif"))]
pub fn encode_avif(_bitmap: &Bitmap, _quality: u8) -> Result<Vec<u8>, EncodeError> {
    Err(EncodeError::UnsupportedFormat(super::OutputFormat::Avif))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::OutputFormat;

    #[cfg(not(feature = "avif"))]
    #[test]
    fn test_avif_unsupported_without_feature() {
        let img = Bitmap::filled(2, 2, [0, 0, 0, 255]);
        assert!(matches!(
            encode_avif(&img, 80),
            Err(EncodeError::UnsupportedFormat(OutputFormat::Avif))
        ));
    }

    #[cfg(feature = "avif")]
    #[test]
    fn test_avif_has_ftyp_box() {
        let img = Bitmap::filled(8, 8, [10, 200, 30, 255]);
        let bytes = encode_avif(&img, 80).unwrap();
        assert_eq!(&bytes[4..8], b"ftyp");
        assert!(OutputFormat::Avif.is_available());
    }
}
