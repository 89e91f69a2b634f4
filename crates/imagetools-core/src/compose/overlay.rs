use crate::bitmap::Bitmap;
use crate::error::{PipelineError, Result};
use crate::transform::{scale, FilterType};

use super::draw_over;

/// Place `overlay`, scaled by `factor`, on top of `base`.
///
/// The position is anchored to the remaining space: the overlay's top-left
/// corner lands at `((W - ow) * x% / 100, (H - oh) * y% / 100)`, so 0% is
/// flush left/top and 100% is flush right/bottom. Overlays larger than the
/// base get a negative offset and are clipped.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` for a non-positive scale or a
/// non-finite position.
pub fn composite(
    base: &Bitmap,
    overlay: &Bitmap,
    x_percent: f64,
    y_percent: f64,
    factor: f64,
    filter: FilterType,
) -> Result<Bitmap> {
    if !(x_percent.is_finite() && y_percent.is_finite()) {
        return Err(PipelineError::invalid(
            "position",
            "overlay position must be finite",
        ));
    }

    let scaled = scale(overlay, factor, filter)?;
    let x = (base.width() as f64 - scaled.width() as f64) * x_percent / 100.0;
    let y = (base.height() as f64 - scaled.height() as f64) * y_percent / 100.0;

    let mut output = base.clone();
    draw_over(&mut output, &scaled, x.floor() as i64, y.floor() as i64);
    Ok(output)
}
