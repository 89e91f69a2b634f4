use crate::bitmap::{Bitmap, CHANNELS};
use crate::color::Rgb;
use crate::error::{PipelineError, Result};

/// Largest possible RGB distance (black to white), squared: `3 × 255²`.
const MAX_DISTANCE_SQ: f64 = 3.0 * 255.0 * 255.0;

/// Make pixels close to `target` fully transparent.
///
/// A pixel is removed when its Euclidean RGB distance to `target` is at most
/// `tolerance_percent / 100` of the maximum distance (`255·√3 ≈ 441.67`).
/// 0% removes exact matches only; 100% removes everything.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` unless the tolerance is within
/// `[0, 100]`.
pub fn color_key(bitmap: &Bitmap, target: Rgb, tolerance_percent: f64) -> Result<Bitmap> {
    if !(0.0..=100.0).contains(&tolerance_percent) {
        return Err(PipelineError::invalid(
            "tolerance_percent",
            format!("must be between 0 and 100, got {tolerance_percent}"),
        ));
    }

    let fraction = tolerance_percent / 100.0;
    let limit_sq = fraction * fraction * MAX_DISTANCE_SQ;

    let mut output = bitmap.clone();
    for px in output.pixels_mut().chunks_exact_mut(CHANNELS) {
        let dr = px[0] as f64 - target.r as f64;
        let dg = px[1] as f64 - target.g as f64;
        let db = px[2] as f64 - target.b as f64;
        if dr * dr + dg * dg + db * db <= limit_sq {
            px[3] = 0;
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_and_white() -> Bitmap {
        Bitmap::from_rgba(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 255]).unwrap()
    }

    #[test]
    fn test_white_at_twenty_percent() {
        let out = color_key(&black_and_white(), Rgb::WHITE, 20.0).unwrap();
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(1, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn test_zero_tolerance_exact_only() {
        let img = Bitmap::from_rgba(2, 1, vec![255, 255, 255, 255, 255, 255, 254, 255]).unwrap();
        let out = color_key(&img, Rgb::WHITE, 0.0).unwrap();
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(1, 0)[3], 255);
    }

    #[test]
    fn test_full_tolerance_removes_everything() {
        let out = color_key(&black_and_white(), Rgb::WHITE, 100.0).unwrap();
        assert!(out.pixels().chunks_exact(4).all(|px| px[3] == 0));
    }

    #[test]
    fn test_color_channels_untouched() {
        let out = color_key(&black_and_white(), Rgb::WHITE, 20.0).unwrap();
        assert_eq!(&out.pixel(0, 0)[..3], &[255, 255, 255]);
    }

    #[test]
    fn test_tolerance_out_of_range() {
        assert!(color_key(&black_and_white(), Rgb::WHITE, -1.0).is_err());
        assert!(color_key(&black_and_white(), Rgb::WHITE, 100.5).is_err());
        assert!(color_key(&black_and_white(), Rgb::WHITE, f64::NAN).is_err());
    }
}
