//! Resizing and scaling.
//!
//! Smooth filters go through `image::imageops::resize`. Nearest neighbor is
//! done here so that block-based stages (pixelate) get exact, uniform blocks.

use image::imageops;

use super::FilterType;
use crate::bitmap::{Bitmap, CHANNELS};
use crate::error::{PipelineError, Result};

/// Resize a bitmap to exact dimensions.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` if either target dimension is 0
/// or the output would exceed [`MAX_PIXELS`](crate::bitmap::MAX_PIXELS).
pub fn resize(bitmap: &Bitmap, width: u32, height: u32, filter: FilterType) -> Result<Bitmap> {
    if width == 0 || height == 0 {
        return Err(PipelineError::invalid(
            "resize",
            format!("target size {width}x{height} must be at least 1x1"),
        ));
    }

    Bitmap::ensure_allocatable("resize", width.into(), height.into())?;

    // Fast path: if dimensions match, just clone
    if bitmap.dimensions() == (width, height) {
        return Ok(bitmap.clone());
    }

    if filter == FilterType::Nearest {
        return resize_nearest(bitmap, width, height);
    }

    let resized = imageops::resize(
        &bitmap.to_rgba_image(),
        width,
        height,
        filter.to_image_filter(),
    );
    Ok(Bitmap::from_rgba_image(resized))
}

/// Nearest-neighbor resample; output `x` reads source `floor((x + 0.5) * sw / dw)`.
pub(crate) fn resize_nearest(bitmap: &Bitmap, width: u32, height: u32) -> Result<Bitmap> {
    let (width, height) = Bitmap::ensure_allocatable("resize", width.into(), height.into())?;
    let (src_w, src_h) = (bitmap.width() as u64, bitmap.height() as u64);
    let src_x: Vec<u32> = (0..width as u64)
        .map(|x| (((2 * x + 1) * src_w) / (2 * width as u64)).min(src_w - 1) as u32)
        .collect();

    let mut output = Vec::with_capacity(width as usize * height as usize * CHANNELS);
    for y in 0..height as u64 {
        let sy = (((2 * y + 1) * src_h) / (2 * height as u64)).min(src_h - 1) as u32;
        for &sx in &src_x {
            output.extend_from_slice(&bitmap.pixel(sx, sy));
        }
    }
    Ok(Bitmap::from_raw_parts(width, height, output))
}

/// Dimensions after scaling by `factor`, rounded and at least 1x1.
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * factor).round().clamp(1.0, u32::MAX as f64)) as u32;
    (scale(width), scale(height))
}

/// Scale a bitmap uniformly (upscaling or downscaling).
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` unless `factor` is finite and
/// positive.
pub fn scale(bitmap: &Bitmap, factor: f64, filter: FilterType) -> Result<Bitmap> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(PipelineError::invalid(
            "factor",
            format!("scale factor must be a positive number, got {factor}"),
        ));
    }
    let (width, height) = scaled_dimensions(bitmap.width(), bitmap.height(), factor);
    resize(bitmap, width, height, filter)
}

/// Resize a bitmap to fit within a maximum edge length while preserving
/// aspect ratio. Bitmaps that already fit are returned unchanged.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` if `max_edge` is 0.
pub fn resize_to_fit(bitmap: &Bitmap, max_edge: u32, filter: FilterType) -> Result<Bitmap> {
    if max_edge == 0 {
        return Err(PipelineError::invalid("max_edge", "must be at least 1"));
    }

    let (src_width, src_height) = bitmap.dimensions();
    if src_width <= max_edge && src_height <= max_edge {
        return Ok(bitmap.clone());
    }

    let (new_width, new_height) = fit_dimensions(src_width, src_height, max_edge);
    resize(bitmap, new_width, new_height, filter)
}

/// Dimensions that fit within `max_edge` with the same aspect ratio.
///
/// The longer edge becomes `max_edge`; the other is rounded and at least 1.
pub fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }

    let ratio = width as f64 / height as f64;

    if width >= height {
        let new_height = (max_edge as f64 / ratio).round() as u32;
        (max_edge, new_height.max(1))
    } else {
        let new_width = (max_edge as f64 * ratio).round() as u32;
        (new_width.max(1), max_edge)
    }
}
