//! Shape masks: circle crop with an optional ring, and rounded corners.
//!
//! Both masks only ever lower alpha; color channels inside the shape are
//! untouched. Edges are anti-aliased.

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::color::Rgb;
use crate::compose::blend_pixel;
use crate::error::{PipelineError, Result};

/// Samples per axis when estimating corner coverage.
const SUPERSAMPLE: u32 = 4;

/// A stroke drawn just inside the circle edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub width: u32,
    pub color: Rgb,
}

/// Center-crop to a square and clip to the inscribed circle.
///
/// The output is `min(w, h)` square with transparent corners. With a ring,
/// a stroke of `ring.width` is drawn at radius `size/2 - width/2` so it
/// stays inside the circle.
pub fn circle_mask(bitmap: &Bitmap, ring: Option<Ring>) -> Bitmap {
    let size = bitmap.width().min(bitmap.height());
    let x0 = (bitmap.width() - size) / 2;
    let y0 = (bitmap.height() - size) / 2;
    let mut output = bitmap.copy_region(x0, y0, size, size);

    let radius = size as f64 / 2.0;
    let ring = ring
        .filter(|r| r.width > 0)
        .map(|r| (r.width.min(size / 2).max(1) as f64, r.color));

    for y in 0..size {
        for x in 0..size {
            let dx = x as f64 + 0.5 - radius;
            let dy = y as f64 + 0.5 - radius;
            let distance = (dx * dx + dy * dy).sqrt();

            let coverage = (radius - distance + 0.5).clamp(0.0, 1.0);
            let mut px = output.pixel(x, y);
            px[3] = (px[3] as f64 * coverage).round() as u8;

            if let Some((width, color)) = ring {
                let inner = radius - width;
                let band = (radius - distance).min(distance - inner) + 0.5;
                let ring_alpha = band.clamp(0.0, 1.0);
                if ring_alpha > 0.0 {
                    let [r, g, b, _] = color.to_rgba();
                    px = blend_pixel(px, [r, g, b, (ring_alpha * 255.0).round() as u8]);
                }
            }

            output.put_pixel(x, y, px);
        }
    }

    output
}

/// Corner radius in pixels: `radius_percent × min(w, h) / 500`, at most half
/// the shorter side.
pub fn corner_radius(width: u32, height: u32, radius_percent: f64) -> f64 {
    let shorter = width.min(height) as f64;
    (radius_percent * shorter / 500.0).clamp(0.0, shorter / 2.0)
}

/// Clip a bitmap to a rounded rectangle with quadratic corner curves.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` unless `radius_percent` is
/// finite and non-negative.
pub fn rounded_corners(bitmap: &Bitmap, radius_percent: f64) -> Result<Bitmap> {
    if !radius_percent.is_finite() || radius_percent < 0.0 {
        return Err(PipelineError::invalid(
            "radius_percent",
            format!("must be a non-negative number, got {radius_percent}"),
        ));
    }

    let (width, height) = bitmap.dimensions();
    let radius = corner_radius(width, height, radius_percent);
    if radius <= 0.0 {
        return Ok(bitmap.clone());
    }

    let mut output = bitmap.clone();
    let span = radius.ceil() as u32;
    let (w, h) = (width as f64, height as f64);

    for y in 0..height {
        // Only rows that touch a corner square need work
        if y >= span && y + span < height {
            continue;
        }
        for x in 0..width {
            if x >= span && x + span < width {
                continue;
            }

            let mut inside = 0u32;
            for sy in 0..SUPERSAMPLE {
                for sx in 0..SUPERSAMPLE {
                    let px = x as f64 + (sx as f64 + 0.5) / SUPERSAMPLE as f64;
                    let py = y as f64 + (sy as f64 + 0.5) / SUPERSAMPLE as f64;
                    // Distance from the nearest vertical and horizontal edge
                    let u = px.min(w - px);
                    let v = py.min(h - py);
                    if inside_corner(u, v, radius) {
                        inside += 1;
                    }
                }
            }

            let total = SUPERSAMPLE * SUPERSAMPLE;
            if inside < total {
                let mut px = output.pixel(x, y);
                px[3] = ((px[3] as u32 * inside + total / 2) / total) as u8;
                output.put_pixel(x, y, px);
            }
        }
    }

    Ok(output)
}

/// Corner test for the curve from `(0, r)` to `(r, 0)` with control point at
/// the corner: the curve is `sqrt(u/r) + sqrt(v/r) = 1`.
#[inline]
fn inside_corner(u: f64, v: f64, radius: f64) -> bool {
    if u >= radius || v >= radius {
        return true;
    }
    (u / radius).sqrt() + (v / radius).sqrt() >= 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAY: [u8; 4] = [100, 100, 100, 255];

    #[test]
    fn test_circle_is_square_and_centered() {
        let img = Bitmap::filled(30, 20, GRAY);
        let out = circle_mask(&img, None);

        assert_eq!(out.dimensions(), (20, 20));
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(19, 19)[3], 0);
        assert_eq!(out.pixel(10, 10), GRAY);
        // Middle of the top edge is on the circle
        assert!(out.pixel(10, 0)[3] > 0);
    }

    #[test]
    fn test_circle_center_crop_takes_middle() {
        let mut pixels = Vec::new();
        for _y in 0..2 {
            for x in 0..6 {
                let v = if (2..4).contains(&x) { 200 } else { 0 };
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        let img = Bitmap::from_rgba(6, 2, pixels).unwrap();
        let out = circle_mask(&img, None);
        assert_eq!(out.dimensions(), (2, 2));
        assert!(out.pixels().chunks_exact(4).all(|px| px[0] == 200));
    }

    #[test]
    fn test_ring_is_inside_circle() {
        let img = Bitmap::filled(40, 40, GRAY);
        let ring = Ring {
            width: 4,
            color: Rgb::new(255, 0, 0),
        };
        let out = circle_mask(&img, Some(ring));

        // Just inside the top edge is ring color
        assert_eq!(out.pixel(20, 1), [255, 0, 0, 255]);
        // Center keeps the image
        assert_eq!(out.pixel(20, 20), GRAY);
        // Corners stay transparent
        assert_eq!(out.pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_zero_width_ring_is_ignored() {
        let img = Bitmap::filled(10, 10, GRAY);
        let ring = Ring {
            width: 0,
            color: Rgb::BLACK,
        };
        assert_eq!(circle_mask(&img, Some(ring)), circle_mask(&img, None));
    }

    #[test]
    fn test_corner_radius_formula() {
        assert!((corner_radius(200, 100, 50.0) - 10.0).abs() < 1e-9);
        // Clamped to half the shorter side
        assert!((corner_radius(200, 100, 1000.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rounded_corners() {
        let img = Bitmap::filled(100, 100, GRAY);
        let out = rounded_corners(&img, 100.0).unwrap();

        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(99, 0)[3], 0);
        assert_eq!(out.pixel(0, 99)[3], 0);
        assert_eq!(out.pixel(99, 99)[3], 0);
        assert_eq!(out.pixel(50, 0), GRAY);
        assert_eq!(out.pixel(50, 50), GRAY);
        assert_eq!(out.pixel(0, 50), GRAY);
    }

    #[test]
    fn test_rounded_corners_zero_is_identity() {
        let img = Bitmap::filled(10, 10, GRAY);
        assert_eq!(rounded_corners(&img, 0.0).unwrap(), img);
        assert!(rounded_corners(&img, -1.0).is_err());
        assert!(rounded_corners(&img, f64::NAN).is_err());
    }

    #[test]
    fn test_inside_corner_curve() {
        assert!(!inside_corner(0.0, 0.0, 10.0));
        assert!(inside_corner(10.0, 0.0, 10.0));
        // On the curve midpoint (t = 0.5): u = v = r/4
        assert!(inside_corner(2.5, 2.5, 10.0));
        assert!(!inside_corner(2.0, 2.0, 10.0));
    }
}
