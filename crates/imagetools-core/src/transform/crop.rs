//! Rectangular cropping.
//!
//! The pipeline crops in integer pixels and refuses rectangles that leave
//! the source. Crop tools that work in percentages (drag handles, presets)
//! convert through [`PercentRect`] first.
//!
//! # Example
//!
//! ```ignore
//! // Top-left 50x50 block of a 100x200 image
//! let block = crop(&image, 0, 0, 50, 50)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::error::{PipelineError, Result};

/// Crop a bitmap to the pixel rectangle `(x, y, width, height)`.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` when `width` or `height` is zero
/// and `PipelineError::OutOfBounds` when the rectangle is not fully inside
/// the bitmap.
pub fn crop(bitmap: &Bitmap, x: u32, y: u32, width: u32, height: u32) -> Result<Bitmap> {
    if width == 0 || height == 0 {
        return Err(PipelineError::invalid(
            "crop",
            format!("{width}x{height} crop must be at least 1x1"),
        ));
    }

    let fits = x as u64 + width as u64 <= bitmap.width() as u64
        && y as u64 + height as u64 <= bitmap.height() as u64;
    if !fits {
        return Err(PipelineError::OutOfBounds {
            x,
            y,
            width,
            height,
            bounds_width: bitmap.width(),
            bounds_height: bitmap.height(),
        });
    }

    // Fast path: full crop returns a clone
    if (x, y, width, height) == (0, 0, bitmap.width(), bitmap.height()) {
        return Ok(bitmap.clone());
    }

    Ok(bitmap.copy_region(x, y, width, height))
}

/// A crop rectangle in percentages (0 to 100) of the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PercentRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Convert to a pixel rectangle `(x, y, width, height)` inside an image of
    /// the given size.
    ///
    /// Values are clamped to the image and the result is at least 1x1, so the
    /// rectangle can always be passed to [`crop`].
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let to_unit = |v: f64| {
            if v.is_finite() {
                (v / 100.0).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };
        let (src_w, src_h) = (image_width as f64, image_height as f64);

        let px_left = ((to_unit(self.x) * src_w).round() as u32).min(image_width.saturating_sub(1));
        let px_top = ((to_unit(self.y) * src_h).round() as u32).min(image_height.saturating_sub(1));
        let px_width = (to_unit(self.width) * src_w).round() as u32;
        let px_height = (to_unit(self.height) * src_h).round() as u32;

        let px_right = px_left.saturating_add(px_width).min(image_width);
        let px_bottom = px_top.saturating_add(px_height).min(image_height);

        (
            px_left,
            px_top,
            px_right.saturating_sub(px_left).max(1),
            px_bottom.saturating_sub(px_top).max(1),
        )
    }
}
