use image::{imageops, Rgba, Rgba32FImage};

use crate::bitmap::{Bitmap, CHANNELS};
use crate::error::{PipelineError, Result};

/// Gaussian sigma for a blur `amount` on a `width × height` image.
///
/// Scaled by the longer side so the perceived blur doesn't depend on
/// resolution: `amount × max(w, h) / 1000`.
pub fn blur_sigma(width: u32, height: u32, amount: f64) -> f32 {
    (amount * width.max(height) as f64 / 1000.0) as f32
}

/// Gaussian blur. `amount` 0 returns the input unchanged.
///
/// Blurring happens in premultiplied alpha so transparent regions don't
/// bleed dark fringes into opaque ones.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` for a negative or non-finite
/// amount.
pub fn blur(bitmap: &Bitmap, amount: f64) -> Result<Bitmap> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(PipelineError::invalid(
            "amount",
            format!("blur amount must be non-negative, got {amount}"),
        ));
    }

    let sigma = blur_sigma(bitmap.width(), bitmap.height(), amount);
    if sigma <= 0.0 {
        return Ok(bitmap.clone());
    }

    let (width, height) = bitmap.dimensions();
    let premultiplied = Rgba32FImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = bitmap.pixel(x, y);
        let alpha = a as f32 / 255.0;
        Rgba([
            r as f32 * alpha,
            g as f32 * alpha,
            b as f32 * alpha,
            a as f32,
        ])
    });

    let blurred = imageops::blur(&premultiplied, sigma);

    let mut output = Vec::with_capacity(bitmap.pixels().len());
    for px in blurred.pixels() {
        let alpha = px[3].clamp(0.0, 255.0);
        if alpha < 0.5 {
            output.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let scale = 255.0 / alpha;
        let channel = |v: f32| (v * scale).clamp(0.0, 255.0).round() as u8;
        output.extend_from_slice(&[
            channel(px[0]),
            channel(px[1]),
            channel(px[2]),
            alpha.round() as u8,
        ]);
    }
    debug_assert_eq!(output.len(), width as usize * height as usize * CHANNELS);

    Ok(Bitmap::from_raw_parts(width, height, output))
}
