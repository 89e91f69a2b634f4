//! Geometric transform stages: resize, rotate, flip, crop, split, combine,
//! masks and borders.
//!
//! Every function borrows its input bitmap and returns a new one.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, x grows right, y grows down
//! - Rotation angles are in degrees, positive = clockwise (screen rotation)
//! - Crop rectangles are integer pixels; [`PercentRect`] converts from
//!   percentages for callers working in UI units

mod border;
mod combine;
mod crop;
mod flip;
mod mask;
mod resize;
mod rotation;
mod split;

use serde::{Deserialize, Serialize};

pub use border::add_border;
pub use combine::{combine, combined_size, Layout};
pub use crop::{crop, PercentRect};
pub use flip::flip;
pub use mask::{circle_mask, corner_radius, rounded_corners, Ring};
pub use resize::{fit_dimensions, resize, resize_to_fit, scale, scaled_dimensions};
pub(crate) use resize::resize_nearest;
pub use rotation::{apply_rotation, compute_rotated_bounds};
pub use split::{split, Tile};

/// Interpolation used when resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor; keeps hard pixel edges (pixel art, upscaling).
    Nearest,
    /// Bilinear, the canvas default smoothing.
    #[default]
    Bilinear,
    /// Lanczos3, the canvas "high" smoothing quality.
    Lanczos3,
}

impl FilterType {
    /// Convert to the `image` crate's filter type.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}
