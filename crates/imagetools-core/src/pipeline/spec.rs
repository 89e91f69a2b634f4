//! The ordered list of operations a tool applies to its source image.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::compose::TextOverlay;
use crate::error::{PipelineError, Result};
use crate::transform::{FilterType, Ring};

fn default_scale() -> f64 {
    1.0
}

/// One stage of a transform pipeline.
///
/// Serialized with an `op` tag, e.g. `{"op": "rotate", "degrees": 90}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformOp {
    /// Resample to exact dimensions.
    Resize {
        width: u32,
        height: u32,
        #[serde(default)]
        filter: FilterType,
    },
    /// Resample both dimensions by `factor` (the upscale tool).
    Scale {
        factor: f64,
        #[serde(default)]
        filter: FilterType,
    },
    /// Rotate clockwise by any angle, growing the canvas to fit.
    Rotate { degrees: f64 },
    Flip {
        #[serde(default)]
        horizontal: bool,
        #[serde(default)]
        vertical: bool,
    },
    /// Pixel rectangle that must lie inside the image.
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Grayscale,
    Sepia,
    Invert,
    Brightness { percent: f64 },
    Contrast { percent: f64 },
    /// Gaussian blur; `amount` is relative to the image size.
    Blur { amount: f64 },
    Threshold { level: u8 },
    /// Remove pixels close to `target` (the transparent-background tool).
    ColorKey { target: Rgb, tolerance_percent: f64 },
    Pixelate { block_size: u32 },
    Border { width: u32, color: Rgb },
    CircleMask {
        #[serde(default)]
        ring: Option<Ring>,
    },
    RoundedCorners { radius_percent: f64 },
    TextOverlay(TextOverlay),
    MemeText {
        #[serde(default)]
        top: String,
        #[serde(default)]
        bottom: String,
    },
    /// Draw the session layer at index `layer` on top of the image.
    Composite {
        layer: usize,
        x_percent: f64,
        y_percent: f64,
        #[serde(default = "default_scale")]
        scale: f64,
    },
    /// Composite onto an opaque background.
    Flatten { background: Rgb },
}

impl TransformOp {
    /// The serialized tag, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            TransformOp::Resize { .. } => "resize",
            TransformOp::Scale { .. } => "scale",
            TransformOp::Rotate { .. } => "rotate",
            TransformOp::Flip { .. } => "flip",
            TransformOp::Crop { .. } => "crop",
            TransformOp::Grayscale => "grayscale",
            TransformOp::Sepia => "sepia",
            TransformOp::Invert => "invert",
            TransformOp::Brightness { .. } => "brightness",
            TransformOp::Contrast { .. } => "contrast",
            TransformOp::Blur { .. } => "blur",
            TransformOp::Threshold { .. } => "threshold",
            TransformOp::ColorKey { .. } => "color_key",
            TransformOp::Pixelate { .. } => "pixelate",
            TransformOp::Border { .. } => "border",
            TransformOp::CircleMask { .. } => "circle_mask",
            TransformOp::RoundedCorners { .. } => "rounded_corners",
            TransformOp::TextOverlay(_) => "text_overlay",
            TransformOp::MemeText { .. } => "meme_text",
            TransformOp::Composite { .. } => "composite",
            TransformOp::Flatten { .. } => "flatten",
        }
    }

    /// True for operations that draw text and need a font loaded.
    pub fn needs_font(&self) -> bool {
        matches!(self, TransformOp::TextOverlay(_) | TransformOp::MemeText { .. })
    }

    /// Check every parameter that doesn't depend on the image itself.
    ///
    /// Crop bounds and layer indices are checked when the stage runs.
    pub fn validate(&self) -> Result<()> {
        match self {
            TransformOp::Resize { width, height, .. } => {
                if *width == 0 || *height == 0 {
                    return Err(PipelineError::invalid(
                        "resize",
                        format!("dimensions must be at least 1x1, got {width}x{height}"),
                    ));
                }
            }
            TransformOp::Scale { factor, .. } => positive("factor", *factor)?,
            TransformOp::Rotate { degrees } => finite("degrees", *degrees)?,
            TransformOp::Crop { width, height, .. } => {
                if *width == 0 || *height == 0 {
                    return Err(PipelineError::invalid(
                        "crop",
                        format!("crop size must be at least 1x1, got {width}x{height}"),
                    ));
                }
            }
            TransformOp::Brightness { percent } => non_negative("brightness", *percent)?,
            TransformOp::Contrast { percent } => non_negative("contrast", *percent)?,
            TransformOp::Blur { amount } => non_negative("amount", *amount)?,
            TransformOp::ColorKey {
                tolerance_percent, ..
            } => {
                if !(0.0..=100.0).contains(tolerance_percent) {
                    return Err(PipelineError::invalid(
                        "tolerance_percent",
                        format!("must be between 0 and 100, got {tolerance_percent}"),
                    ));
                }
            }
            TransformOp::Pixelate { block_size } => {
                if *block_size == 0 {
                    return Err(PipelineError::invalid("block_size", "must be at least 1"));
                }
            }
            TransformOp::RoundedCorners { radius_percent } => {
                non_negative("radius_percent", *radius_percent)?
            }
            TransformOp::TextOverlay(overlay) => {
                positive("size", f64::from(overlay.size))?;
                finite("x_percent", overlay.x_percent)?;
                finite("y_percent", overlay.y_percent)?;
            }
            TransformOp::Composite {
                x_percent,
                y_percent,
                scale,
                ..
            } => {
                finite("x_percent", *x_percent)?;
                finite("y_percent", *y_percent)?;
                positive("scale", *scale)?;
            }
            TransformOp::Flip { .. }
            | TransformOp::Grayscale
            | TransformOp::Sepia
            | TransformOp::Invert
            | TransformOp::Threshold { .. }
            | TransformOp::Border { .. }
            | TransformOp::CircleMask { .. }
            | TransformOp::MemeText { .. }
            | TransformOp::Flatten { .. } => {}
        }
        Ok(())
    }
}

fn finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PipelineError::invalid(name, format!("must be finite, got {value}")))
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PipelineError::invalid(name, format!("must be positive, got {value}")))
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PipelineError::invalid(
            name,
            format!("must be zero or positive, got {value}"),
        ))
    }
}

/// A validated, ordered sequence of [`TransformOp`]s.
///
/// The only ways to build one run [`TransformOp::validate`] on every
/// operation, including deserialization, so a `TransformSpec` in hand is
/// always valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TransformOp>", into = "Vec<TransformOp>")]
pub struct TransformSpec {
    ops: Vec<TransformOp>,
}

impl TransformSpec {
    /// # Errors
    ///
    /// Returns the first operation's `InvalidParameter` error.
    pub fn new(ops: Vec<TransformOp>) -> Result<Self> {
        for op in &ops {
            op.validate()?;
        }
        Ok(Self { ops })
    }

    /// A spec that leaves the image unchanged (format conversion).
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[TransformOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn needs_font(&self) -> bool {
        self.ops.iter().any(TransformOp::needs_font)
    }

    /// Number of session layers the spec refers to (highest index + 1).
    pub fn layers_required(&self) -> usize {
        self.ops
            .iter()
            .filter_map(|op| match op {
                TransformOp::Composite { layer, .. } => Some(layer + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

impl TryFrom<Vec<TransformOp>> for TransformSpec {
    type Error = PipelineError;

    fn try_from(ops: Vec<TransformOp>) -> Result<Self> {
        Self::new(ops)
    }
}

impl From<TransformSpec> for Vec<TransformOp> {
    fn from(spec: TransformSpec) -> Self {
        spec.ops
    }
}
