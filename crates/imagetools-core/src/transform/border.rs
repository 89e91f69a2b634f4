use crate::bitmap::Bitmap;
use crate::color::Rgb;
use crate::compose::draw_over;
use crate::error::Result;

/// Surround a bitmap with a solid border.
///
/// The canvas grows by `2 × width` in each dimension, is filled with
/// `color`, and the source is drawn at `(width, width)`. Transparent source
/// pixels show the border color through.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` when the grown canvas would be
/// too large to allocate.
pub fn add_border(bitmap: &Bitmap, width: u32, color: Rgb) -> Result<Bitmap> {
    if width == 0 {
        return Ok(bitmap.clone());
    }

    let grow = |v: u32| u64::from(v) + 2 * u64::from(width);
    let (out_w, out_h) =
        Bitmap::ensure_allocatable("border", grow(bitmap.width()), grow(bitmap.height()))?;

    let mut canvas = Bitmap::filled(out_w, out_h, color.to_rgba());
    draw_over(&mut canvas, bitmap, width as i64, width as i64);
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_geometry() {
        let img = Bitmap::filled(10, 6, [0, 0, 255, 255]);
        let out = add_border(&img, 3, Rgb::new(255, 0, 0)).unwrap();

        assert_eq!(out.dimensions(), (16, 12));
        assert_eq!(out.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(out.pixel(2, 2), [255, 0, 0, 255]);
        assert_eq!(out.pixel(3, 3), [0, 0, 255, 255]);
        assert_eq!(out.pixel(12, 8), [0, 0, 255, 255]);
        assert_eq!(out.pixel(13, 9), [255, 0, 0, 255]);
    }

    #[test]
    fn test_transparent_source_shows_border_color() {
        let img = Bitmap::transparent(2, 2);
        let out = add_border(&img, 1, Rgb::WHITE).unwrap();
        assert_eq!(out.pixel(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn test_huge_border_is_rejected() {
        let img = Bitmap::filled(4, 4, [9, 9, 9, 255]);
        let result = add_border(&img, u32::MAX, Rgb::BLACK);
        assert!(matches!(
            result,
            Err(crate::PipelineError::InvalidParameter { name: "border", .. })
        ));
        assert!(add_border(&img, 1 << 16, Rgb::BLACK).is_err());
    }

    #[test]
    fn test_zero_width_is_identity() {
        let img = Bitmap::filled(4, 4, [9, 9, 9, 255]);
        assert_eq!(add_border(&img, 0, Rgb::BLACK).unwrap(), img);
    }
}
