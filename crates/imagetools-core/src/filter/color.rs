//! CSS filter-function color operations.
//!
//! Each function matches the corresponding CSS `filter` at the given amount:
//! `grayscale(100%)`, `sepia(100%)`, `invert(100%)`, `brightness(p%)` and
//! `contrast(p%)`. Alpha is never changed.

use crate::bitmap::{Bitmap, CHANNELS};
use crate::error::{PipelineError, Result};

/// ITU-R BT.709 luma coefficients, as used by the CSS grayscale matrix.
pub const LUMA_R: f32 = 0.2126;
pub const LUMA_G: f32 = 0.7152;
pub const LUMA_B: f32 = 0.0722;

/// CSS `sepia(1)` matrix rows.
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

/// Luma (0-255) of an sRGB triple using BT.709 weights.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32;
    y.clamp(0.0, 255.0).round() as u8
}

/// Apply a function to every RGB triple, keeping alpha.
fn map_rgb(bitmap: &Bitmap, f: impl Fn(u8, u8, u8) -> [u8; 3]) -> Bitmap {
    let mut output = bitmap.clone();
    for px in output.pixels_mut().chunks_exact_mut(CHANNELS) {
        let [r, g, b] = f(px[0], px[1], px[2]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
    output
}

/// Apply a per-channel lookup table to R, G and B.
fn map_channels(bitmap: &Bitmap, lut: &[u8; 256]) -> Bitmap {
    map_rgb(bitmap, |r, g, b| {
        [lut[r as usize], lut[g as usize], lut[b as usize]]
    })
}

fn build_lut(f: impl Fn(f32) -> f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (i, slot) in lut.iter_mut().enumerate() {
        *slot = f(i as f32).clamp(0.0, 255.0).round() as u8;
    }
    lut
}

fn check_percent(name: &'static str, percent: f64) -> Result<()> {
    if !percent.is_finite() || percent < 0.0 {
        return Err(PipelineError::invalid(
            name,
            format!("must be a non-negative percentage, got {percent}"),
        ));
    }
    Ok(())
}

pub fn grayscale(bitmap: &Bitmap) -> Bitmap {
    map_rgb(bitmap, |r, g, b| {
        let y = luma(r, g, b);
        [y, y, y]
    })
}

pub fn sepia(bitmap: &Bitmap) -> Bitmap {
    map_rgb(bitmap, |r, g, b| {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let row = |m: [f32; 3]| (m[0] * r + m[1] * g + m[2] * b).clamp(0.0, 255.0).round() as u8;
        [row(SEPIA[0]), row(SEPIA[1]), row(SEPIA[2])]
    })
}

pub fn invert(bitmap: &Bitmap) -> Bitmap {
    map_rgb(bitmap, |r, g, b| [255 - r, 255 - g, 255 - b])
}

/// Multiply every channel by `percent / 100`. 100% is the identity.
pub fn brightness(bitmap: &Bitmap, percent: f64) -> Result<Bitmap> {
    check_percent("brightness", percent)?;
    if percent == 100.0 {
        return Ok(bitmap.clone());
    }
    let k = (percent / 100.0) as f32;
    Ok(map_channels(bitmap, &build_lut(|v| v * k)))
}

/// Scale each channel's distance from mid-gray: `(v - 0.5)·k + 0.5`.
/// 100% is the identity, 0% is flat gray.
pub fn contrast(bitmap: &Bitmap, percent: f64) -> Result<Bitmap> {
    check_percent("contrast", percent)?;
    if percent == 100.0 {
        return Ok(bitmap.clone());
    }
    let k = (percent / 100.0) as f32;
    Ok(map_channels(
        bitmap,
        &build_lut(|v| ((v / 255.0 - 0.5) * k + 0.5) * 255.0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(px: [u8; 4]) -> Bitmap {
        Bitmap::filled(1, 1, px)
    }

    #[test]
    fn test_luma_coefficients_sum_to_one() {
        assert!((LUMA_R + LUMA_G + LUMA_B - 1.0).abs() < 1e-6);
        for v in [0u8, 64, 128, 255] {
            assert_eq!(luma(v, v, v), v);
        }
    }

    #[test]
    fn test_grayscale() {
        let out = grayscale(&single([255, 0, 0, 200]));
        assert_eq!(out.pixel(0, 0), [54, 54, 54, 200]);
    }

    #[test]
    fn test_sepia_white_saturates() {
        let out = sepia(&single([255, 255, 255, 255]));
        // Red and green rows sum above 1, blue row is 0.937
        assert_eq!(out.pixel(0, 0), [255, 255, 239, 255]);
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let img = single([10, 200, 30, 77]);
        assert_eq!(invert(&img).pixel(0, 0), [245, 55, 225, 77]);
        assert_eq!(invert(&invert(&img)), img);
    }

    #[test]
    fn test_brightness() {
        let img = single([100, 200, 50, 255]);
        assert_eq!(brightness(&img, 100.0).unwrap(), img);
        assert_eq!(brightness(&img, 50.0).unwrap().pixel(0, 0), [50, 100, 25, 255]);
        assert_eq!(brightness(&img, 200.0).unwrap().pixel(0, 0), [200, 255, 100, 255]);
        assert!(brightness(&img, -5.0).is_err());
    }

    #[test]
    fn test_contrast() {
        let img = single([0, 128, 255, 255]);
        assert_eq!(contrast(&img, 100.0).unwrap(), img);

        let flat = contrast(&img, 0.0).unwrap().pixel(0, 0);
        assert!(flat[..3].iter().all(|&v| v == 128));

        let strong = contrast(&img, 200.0).unwrap().pixel(0, 0);
        assert_eq!(strong[0], 0);
        assert_eq!(strong[2], 255);
        assert!(contrast(&img, f64::NAN).is_err());
    }
}
