//! The decode → transform → encode pipeline.
//!
//! Every tool is the same three steps with a different [`TransformSpec`]:
//!
//! ```ignore
//! let source = decode_image(&bytes, Some("image/png"), &config)?;
//! let spec = TransformSpec::new(vec![TransformOp::Grayscale])?;
//! let encoded = render(&source, &spec, &OutputSpec::png(), &StageContext::new(&config))?;
//! ```
//!
//! Each stage is a pure function of the previous bitmap; the source is never
//! modified.

mod spec;

use std::borrow::Cow;

use tracing::debug;

use crate::bitmap::Bitmap;
use crate::compose::{composite, draw_text, flatten, meme_text, Font};
use crate::config::PipelineConfig;
use crate::decode::SourceImage;
use crate::encode::{encode, EncodedImage, OutputSpec};
use crate::error::{PipelineError, Result};
use crate::filter;
use crate::transform;

pub use spec::{TransformOp, TransformSpec};

/// The bitmap produced by running a [`TransformSpec`]; may differ in size
/// from the source.
pub type RenderedImage = Bitmap;

/// Inputs a stage may need besides the bitmap it transforms.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    /// Extra images referenced by `Composite { layer }`.
    pub layers: &'a [Bitmap],
    /// Font for text stages.
    pub font: Option<&'a Font>,
    pub config: &'a PipelineConfig,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self {
            layers: &[],
            font: None,
            config,
        }
    }

    pub fn with_layers(mut self, layers: &'a [Bitmap]) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_font(mut self, font: Option<&'a Font>) -> Self {
        self.font = font;
        self
    }

    fn require_font(&self) -> Result<&'a Font> {
        self.font
            .ok_or_else(|| PipelineError::invalid("font", "no font loaded for text rendering"))
    }

    fn layer(&self, index: usize) -> Result<&'a Bitmap> {
        self.layers.get(index).ok_or_else(|| {
            PipelineError::invalid(
                "layer",
                format!("layer {index} requested but {} loaded", self.layers.len()),
            )
        })
    }
}

/// Largest bitmap a stage allocates, for the stages that can grow one.
///
/// For `Composite` this is the scaled overlay rather than the output.
fn grown_size(bitmap: &Bitmap, op: &TransformOp, ctx: &StageContext<'_>) -> Option<(u64, u64)> {
    let (width, height) = bitmap.dimensions();
    let size = match op {
        TransformOp::Resize {
            width: w,
            height: h,
            ..
        } => (*w, *h),
        TransformOp::Scale { factor, .. } => transform::scaled_dimensions(width, height, *factor),
        TransformOp::Rotate { degrees } => {
            transform::compute_rotated_bounds(width, height, *degrees)
        }
        TransformOp::Border { width: border, .. } => {
            let grow = |v: u32| u64::from(v) + 2 * u64::from(*border);
            return Some((grow(width), grow(height)));
        }
        TransformOp::Composite { layer, scale, .. } => {
            let overlay = ctx.layers.get(*layer)?;
            transform::scaled_dimensions(overlay.width(), overlay.height(), *scale)
        }
        _ => return None,
    };
    Some((size.0.into(), size.1.into()))
}

/// Apply a single operation to `bitmap`.
///
/// Stages that grow the canvas are checked against the configured size
/// limits before anything is allocated.
///
/// # Errors
///
/// Propagates the stage's error: `InvalidParameter` for a missing font or
/// layer or an output over the size limits, `OutOfBounds` for a crop
/// outside the image.
pub fn apply_op(bitmap: &Bitmap, op: &TransformOp, ctx: &StageContext<'_>) -> Result<Bitmap> {
    if let Some((width, height)) = grown_size(bitmap, op, ctx) {
        ctx.config.check_output_size(op.name(), width, height)?;
    }

    match op {
        TransformOp::Resize {
            width,
            height,
            filter,
        } => transform::resize(bitmap, *width, *height, *filter),
        TransformOp::Scale { factor, filter } => transform::scale(bitmap, *factor, *filter),
        TransformOp::Rotate { degrees } => {
            transform::apply_rotation(bitmap, *degrees, ctx.config.resample_filter)
        }
        TransformOp::Flip {
            horizontal,
            vertical,
        } => Ok(transform::flip(bitmap, *horizontal, *vertical)),
        TransformOp::Crop {
            x,
            y,
            width,
            height,
        } => transform::crop(bitmap, *x, *y, *width, *height),
        TransformOp::Grayscale => Ok(filter::grayscale(bitmap)),
        TransformOp::Sepia => Ok(filter::sepia(bitmap)),
        TransformOp::Invert => Ok(filter::invert(bitmap)),
        TransformOp::Brightness { percent } => filter::brightness(bitmap, *percent),
        TransformOp::Contrast { percent } => filter::contrast(bitmap, *percent),
        TransformOp::Blur { amount } => filter::blur(bitmap, *amount),
        TransformOp::Threshold { level } => Ok(filter::threshold(bitmap, *level)),
        TransformOp::ColorKey {
            target,
            tolerance_percent,
        } => filter::color_key(bitmap, *target, *tolerance_percent),
        TransformOp::Pixelate { block_size } => filter::pixelate(bitmap, *block_size),
        TransformOp::Border { width, color } => transform::add_border(bitmap, *width, *color),
        TransformOp::CircleMask { ring } => Ok(transform::circle_mask(bitmap, *ring)),
        TransformOp::RoundedCorners { radius_percent } => {
            transform::rounded_corners(bitmap, *radius_percent)
        }
        TransformOp::TextOverlay(overlay) => draw_text(bitmap, ctx.require_font()?, overlay),
        TransformOp::MemeText { top, bottom } => {
            Ok(meme_text(bitmap, ctx.require_font()?, top, bottom))
        }
        TransformOp::Composite {
            layer,
            x_percent,
            y_percent,
            scale,
        } => composite(
            bitmap,
            ctx.layer(*layer)?,
            *x_percent,
            *y_percent,
            *scale,
            ctx.config.resample_filter,
        ),
        TransformOp::Flatten { background } => Ok(flatten(bitmap, *background)),
    }
}

/// Run every stage of `spec` in order.
///
/// An empty spec returns a copy of the source.
pub fn run_transforms(
    source: &Bitmap,
    spec: &TransformSpec,
    ctx: &StageContext<'_>,
) -> Result<RenderedImage> {
    let mut current = Cow::Borrowed(source);
    for (index, op) in spec.ops().iter().enumerate() {
        let next = apply_op(&current, op, ctx)?;
        debug!(
            stage = index,
            op = op.name(),
            width = next.width(),
            height = next.height(),
            "applied stage"
        );
        current = Cow::Owned(next);
    }
    Ok(current.into_owned())
}

/// Transform `source` and encode the result.
pub fn render(
    source: &SourceImage,
    spec: &TransformSpec,
    output: &OutputSpec,
    ctx: &StageContext<'_>,
) -> Result<EncodedImage> {
    let rendered = run_transforms(source.bitmap(), spec, ctx)?;
    Ok(encode(&rendered, output, ctx.config.flatten_background)?)
}
