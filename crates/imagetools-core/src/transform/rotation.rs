//! Arbitrary-angle rotation with an expanded, transparent canvas.
//!
//! Quarter turns are lossless pixel permutations. Every other angle uses
//! inverse mapping: for each output pixel center we find the source
//! position and interpolate premultiplied RGBA, so edges fade to
//! transparent instead of black.
//!
//! # Algorithm
//!
//! For a clockwise rotation by θ in screen coordinates (y down), the inverse
//! transform is:
//! ```text
//! src_x =  (dst_x - dst_cx) * cos(θ) + (dst_y - dst_cy) * sin(θ) + src_cx
//! src_y = -(dst_x - dst_cx) * sin(θ) + (dst_y - dst_cy) * cos(θ) + src_cy
//! ```

use image::imageops;

use super::FilterType;
use crate::bitmap::Bitmap;
use crate::error::{PipelineError, Result};

const ANGLE_EPSILON: f64 = 0.001;

/// Canvas size that holds a `width × height` bitmap rotated by `angle_degrees`.
///
/// `new_w = |w·cosθ| + |h·sinθ|`, `new_h = |w·sinθ| + |h·cosθ|`, rounded to
/// whole pixels and never smaller than 1x1.
///
/// # Example
///
/// ```
/// use imagetools_core::transform::compute_rotated_bounds;
///
/// // A quarter turn swaps width and height
/// assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
/// assert_eq!(compute_rotated_bounds(100, 50, 0.0), (100, 50));
/// ```
pub fn compute_rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    match quarter_turns(angle_degrees) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos().abs();
    let sin = angle_rad.sin().abs();

    let w = width as f64;
    let h = height as f64;

    // Float-to-int casts saturate, so oversized bounds come out as u32::MAX.
    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// Number of clockwise quarter turns if the angle is (nearly) a multiple of 90°.
fn quarter_turns(angle_degrees: f64) -> Option<u8> {
    let normalized = angle_degrees.rem_euclid(360.0);
    let turns = (normalized / 90.0).round();
    if (normalized - turns * 90.0).abs() < ANGLE_EPSILON {
        Some((turns as u8) % 4)
    } else {
        None
    }
}

/// Rotate a bitmap clockwise around its center.
///
/// The output canvas is expanded to fit the entire rotated image and the
/// uncovered corners are transparent. `Nearest` sampling keeps hard edges,
/// `Bilinear` suits previews and `Lanczos3` suits export.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` for a non-finite angle or an
/// expanded canvas too large to allocate.
pub fn apply_rotation(bitmap: &Bitmap, angle_degrees: f64, filter: FilterType) -> Result<Bitmap> {
    if !angle_degrees.is_finite() {
        return Err(PipelineError::invalid(
            "degrees",
            format!("rotation angle must be finite, got {angle_degrees}"),
        ));
    }

    match quarter_turns(angle_degrees) {
        Some(0) => return Ok(bitmap.clone()),
        Some(1) => return Ok(Bitmap::from_rgba_image(imageops::rotate90(&bitmap.to_rgba_image()))),
        Some(2) => return Ok(Bitmap::from_rgba_image(imageops::rotate180(&bitmap.to_rgba_image()))),
        Some(_) => return Ok(Bitmap::from_rgba_image(imageops::rotate270(&bitmap.to_rgba_image()))),
        None => {}
    }

    let (src_w, src_h) = (bitmap.width() as f64, bitmap.height() as f64);
    let (dst_w, dst_h) = compute_rotated_bounds(bitmap.width(), bitmap.height(), angle_degrees);
    let (dst_w, dst_h) = Bitmap::ensure_allocatable("rotate", dst_w.into(), dst_h.into())?;

    let angle_rad = angle_degrees.to_radians();
    let cos = angle_rad.cos();
    let sin = angle_rad.sin();

    let src_cx = src_w / 2.0;
    let src_cy = src_h / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    let mut output = Bitmap::transparent(dst_w, dst_h);

    for dst_y in 0..dst_h {
        for dst_x in 0..dst_w {
            // Pixel centers, relative to the canvas center
            let dx = dst_x as f64 + 0.5 - dst_cx;
            let dy = dst_y as f64 + 0.5 - dst_cy;

            // Back to source pixel-index space (centers at integer + 0.5)
            let src_x = dx * cos + dy * sin + src_cx - 0.5;
            let src_y = -dx * sin + dy * cos + src_cy - 0.5;

            let pixel = match filter {
                FilterType::Nearest => sample_nearest(bitmap, src_x, src_y),
                FilterType::Bilinear => sample_bilinear(bitmap, src_x, src_y),
                FilterType::Lanczos3 => sample_lanczos3(bitmap, src_x, src_y),
            };
            output.put_pixel(dst_x, dst_y, pixel);
        }
    }

    Ok(output)
}

/// Premultiplied RGBA at integer coordinates; transparent outside the bitmap.
#[inline]
fn premultiplied(bitmap: &Bitmap, px: i64, py: i64) -> [f64; 4] {
    if px < 0 || py < 0 || px >= bitmap.width() as i64 || py >= bitmap.height() as i64 {
        return [0.0; 4];
    }
    let [r, g, b, a] = bitmap.pixel(px as u32, py as u32);
    let alpha = a as f64 / 255.0;
    [r as f64 * alpha, g as f64 * alpha, b as f64 * alpha, a as f64]
}

/// Convert an accumulated premultiplied sample back to straight alpha.
#[inline]
fn unpremultiply(sum: [f64; 4]) -> [u8; 4] {
    let alpha = sum[3].clamp(0.0, 255.0);
    if alpha < 0.5 {
        return [0, 0, 0, 0];
    }
    let scale = 255.0 / alpha;
    let channel = |v: f64| (v * scale).clamp(0.0, 255.0).round() as u8;
    [channel(sum[0]), channel(sum[1]), channel(sum[2]), alpha.round() as u8]
}

fn sample_nearest(bitmap: &Bitmap, x: f64, y: f64) -> [u8; 4] {
    let (px, py) = (x.round() as i64, y.round() as i64);
    if px < 0 || py < 0 || px >= bitmap.width() as i64 || py >= bitmap.height() as i64 {
        return [0, 0, 0, 0];
    }
    bitmap.pixel(px as u32, py as u32)
}

/// Premultiplied bilinear sample from the 2x2 neighbourhood of `(x, y)`.
fn sample_bilinear(bitmap: &Bitmap, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (bitmap.width() as f64, bitmap.height() as f64);

    // Fully outside (more than one pixel past the edge)
    if x <= -1.0 || y <= -1.0 || x >= w || y >= h {
        return [0, 0, 0, 0];
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = premultiplied(bitmap, x0, y0);
    let p10 = premultiplied(bitmap, x0 + 1, y0);
    let p01 = premultiplied(bitmap, x0, y0 + 1);
    let p11 = premultiplied(bitmap, x0 + 1, y0 + 1);

    let mut sum = [0.0f64; 4];
    for i in 0..4 {
        sum[i] = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
    }

    unpremultiply(sum)
}

/// Premultiplied Lanczos3 sample over a 6x6 window.
fn sample_lanczos3(bitmap: &Bitmap, x: f64, y: f64) -> [u8; 4] {
    let (w, h) = (bitmap.width() as i64, bitmap.height() as i64);

    // Near the border the kernel mostly sees transparency, so fall back
    if x < 2.0 || x >= (w - 3) as f64 || y < 2.0 || y >= (h - 3) as f64 {
        return sample_bilinear(bitmap, x, y);
    }

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;

    let mut sum = [0.0f64; 4];
    let mut weight_sum = 0.0;

    for ky in -2..=3 {
        for kx in -2..=3 {
            let px = x0 + kx;
            let py = y0 + ky;
            let weight = lanczos_weight(x - px as f64, 3.0) * lanczos_weight(y - py as f64, 3.0);

            let pixel = premultiplied(bitmap, px, py);
            for i in 0..4 {
                sum[i] += pixel[i] * weight;
            }
            weight_sum += weight;
        }
    }

    if weight_sum <= 0.0 {
        return [0, 0, 0, 0];
    }
    for v in &mut sum {
        *v /= weight_sum;
    }
    unpremultiply(sum)
}

/// Windowed sinc of radius `a`.
///
/// ```text
/// L(x) = sinc(x) * sinc(x/a)  for |x| < a
/// L(x) = 0                     for |x| >= a
/// ```
fn lanczos_weight(x: f64, a: f64) -> f64 {
    if x.abs() < f64::EPSILON {
        return 1.0;
    }
    if x.abs() >= a {
        return 0.0;
    }

    let pi_x = std::f64::consts::PI * x;
    let pi_x_a = pi_x / a;

    (a * pi_x.sin() * pi_x_a.sin()) / (pi_x * pi_x)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a simple opaque test image with a gradient pattern.
    fn test_image(width: u32, height: u32) -> Bitmap {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x + y) * 8) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        Bitmap::from_rgba(width, height, pixels).unwrap()
    }

    #[test]
    fn test_zero_and_full_turn_are_identity() {
        let img = test_image(30, 20);
        assert_eq!(apply_rotation(&img, 0.0, FilterType::Bilinear).unwrap(), img);
        assert_eq!(apply_rotation(&img, 360.0, FilterType::Bilinear).unwrap(), img);
        assert_eq!(apply_rotation(&img, -720.0, FilterType::Lanczos3).unwrap(), img);
    }

    #[test]
    fn test_quarter_turn_is_clockwise_and_lossless() {
        // Red on the left, green on the right
        let img = Bitmap::from_rgba(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 255]).unwrap();

        let result = apply_rotation(&img, 90.0, FilterType::Bilinear).unwrap();
        assert_eq!(result.dimensions(), (1, 2));
        // Clockwise: left ends up on top
        assert_eq!(result.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(result.pixel(0, 1), [0, 255, 0, 255]);

        let ccw = apply_rotation(&img, -90.0, FilterType::Bilinear).unwrap();
        assert_eq!(ccw.pixel(0, 0), [0, 255, 0, 255]);
    }

    #[test]
    fn test_half_turn_round_trips() {
        let img = test_image(7, 5);
        let once = apply_rotation(&img, 180.0, FilterType::Bilinear).unwrap();
        let twice = apply_rotation(&once, 180.0, FilterType::Bilinear).unwrap();
        assert_eq!(twice, img);
    }

    #[test]
    fn test_non_finite_angle_rejected() {
        let img = test_image(4, 4);
        assert!(apply_rotation(&img, f64::NAN, FilterType::Bilinear).is_err());
        assert!(apply_rotation(&img, f64::INFINITY, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_90_degree_rotation_bounds() {
        assert_eq!(compute_rotated_bounds(100, 50, 90.0), (50, 100));
        assert_eq!(compute_rotated_bounds(100, 50, 270.0), (50, 100));
        assert_eq!(compute_rotated_bounds(100, 50, -90.0), (50, 100));
    }

    #[test]
    fn test_45_degree_rotation_bounds() {
        let (w, h) = compute_rotated_bounds(100, 100, 45.0);
        // Diagonal of 100x100 square is ~141.4
        assert_eq!((w, h), (141, 141));
    }

    #[test]
    fn test_opposite_rotations_same_bounds() {
        assert_eq!(
            compute_rotated_bounds(100, 80, 30.0),
            compute_rotated_bounds(100, 80, -30.0)
        );
    }

    #[test]
    fn test_large_rotation_angles() {
        assert_eq!(compute_rotated_bounds(100, 50, 720.0), (100, 50));
        assert_eq!(compute_rotated_bounds(100, 50, 450.0), (50, 100));
    }

    #[test]
    fn test_rotation_corners_are_transparent() {
        let img = test_image(40, 40);
        let result = apply_rotation(&img, 45.0, FilterType::Bilinear).unwrap();

        assert!(result.width() > img.width());
        assert_eq!(result.pixel(0, 0)[3], 0);
        assert_eq!(result.pixel(result.width() - 1, result.height() - 1)[3], 0);
        // The center stays opaque
        assert_eq!(result.pixel(result.width() / 2, result.height() / 2)[3], 255);
    }

    #[test]
    fn test_edges_do_not_darken() {
        // A uniform white image rotated should never produce gray opaque pixels
        let img = Bitmap::filled(20, 20, [255, 255, 255, 255]);
        let result = apply_rotation(&img, 30.0, FilterType::Bilinear).unwrap();
        for px in result.pixels().chunks_exact(4) {
            if px[3] > 0 {
                assert!(px[0] >= 254, "edge pixel darkened: {px:?}");
            }
        }
    }

    #[test]
    fn test_bilinear_vs_lanczos_same_dimensions() {
        let img = test_image(50, 50);
        let bilinear = apply_rotation(&img, 15.0, FilterType::Bilinear).unwrap();
        let lanczos = apply_rotation(&img, 15.0, FilterType::Lanczos3).unwrap();
        let nearest = apply_rotation(&img, 15.0, FilterType::Nearest).unwrap();
        assert_eq!(bilinear.dimensions(), lanczos.dimensions());
        assert_eq!(bilinear.dimensions(), nearest.dimensions());
    }

    #[test]
    fn test_1x1_image_rotation() {
        let img = Bitmap::filled(1, 1, [128, 128, 128, 255]);
        let result = apply_rotation(&img, 45.0, FilterType::Lanczos3).unwrap();
        assert!(result.width() >= 1 && result.height() >= 1);
    }

    #[test]
    fn test_lanczos_weight_properties() {
        assert!((lanczos_weight(0.0, 3.0) - 1.0).abs() < f64::EPSILON);
        assert!(lanczos_weight(3.0, 3.0).abs() < f64::EPSILON);
        assert!((lanczos_weight(1.5, 3.0) - lanczos_weight(-1.5, 3.0)).abs() < 1e-10);
    }

    #[test]
    fn test_bounds_never_zero() {
        for angle in [1.0, 15.0, 45.0, 89.0, 90.0, 135.0, 179.0, 180.0, 270.0, 359.0] {
            let (w, h) = compute_rotated_bounds(10, 1, angle);
            assert!(w > 0 && h > 0, "zero bounds for angle {angle}");
        }
    }

    #[test]
    fn test_oversized_rotation_is_rejected() {
        assert_eq!(
            compute_rotated_bounds(u32::MAX, u32::MAX, 45.0),
            (u32::MAX, u32::MAX)
        );

        // A 30000x1 strip at 45° needs a ~21214x21214 canvas.
        let strip = Bitmap::filled(30_000, 1, [255, 0, 0, 255]);
        let result = apply_rotation(&strip, 45.0, FilterType::Nearest);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidParameter { name: "rotate", .. })
        ));
        // Quarter turns never grow the canvas.
        assert_eq!(
            apply_rotation(&strip, 90.0, FilterType::Nearest).unwrap().dimensions(),
            (1, 30_000)
        );
    }
}
