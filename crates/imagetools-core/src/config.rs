//! Pipeline configuration.
//!
//! A [`PipelineConfig`] is owned by each tool session and passed explicitly to
//! every invocation. All fields have defaults so the browser can send a
//! partial object.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::error::PipelineError;
use crate::transform::FilterType;

/// Tunables shared by the decode, transform and encode stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Quality used when a tool doesn't specify one (0.0 to 1.0).
    pub default_quality: f32,
    /// Interpolation used by stages that resample (overlay scaling, collage cells).
    pub resample_filter: FilterType,
    /// Background that transparency is flattened onto for JPEG export.
    pub flatten_background: Rgb,
    /// Decoded images and stage outputs above this pixel count are rejected.
    pub max_pixels: u64,
    /// Cap on either side of a decoded image or stage output.
    pub max_dimension: u32,
    /// Width of a grid collage canvas; cells are `collage_width / columns` square.
    pub collage_width: u32,
    /// Fill behind grid collage cells.
    pub collage_background: Rgb,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_quality: 0.9,
            resample_filter: FilterType::Bilinear,
            flatten_background: Rgb::WHITE,
            // 100 megapixels
            max_pixels: 100_000_000,
            max_dimension: 32_768,
            collage_width: 1200,
            collage_background: Rgb::WHITE,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject a `width × height` stage output that exceeds the limits.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidParameter` named after `stage`.
    pub fn check_output_size(
        &self,
        stage: &'static str,
        width: u64,
        height: u64,
    ) -> Result<(), PipelineError> {
        let max_side = u64::from(self.max_dimension);
        let within = width <= max_side
            && height <= max_side
            && width
                .checked_mul(height)
                .is_some_and(|pixels| pixels <= self.max_pixels);
        if within {
            Ok(())
        } else {
            Err(PipelineError::invalid(
                stage,
                format!(
                    "output of {width}x{height} exceeds the limit of {} pixels or {} per side",
                    self.max_pixels, self.max_dimension
                ),
            ))
        }
    }

    /// Cell edge length for a grid collage with `columns` columns.
    pub fn collage_cell_size(&self, columns: u32) -> u32 {
        (self.collage_width / columns.max(1)).max(1)
    }
}
