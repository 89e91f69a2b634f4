use crate::bitmap::Bitmap;
use crate::error::{PipelineError, Result};
use crate::transform::resize_nearest;

/// Pixelate with square blocks of `block_size` pixels.
///
/// Downsamples with nearest neighbor to `ceil(w / b) × ceil(h / b)`, then
/// upsamples back to `w × h`, again nearest neighbor.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` if `block_size` is 0.
pub fn pixelate(bitmap: &Bitmap, block_size: u32) -> Result<Bitmap> {
    if block_size == 0 {
        return Err(PipelineError::invalid("block_size", "must be at least 1"));
    }
    if block_size == 1 {
        return Ok(bitmap.clone());
    }

    let (width, height) = bitmap.dimensions();
    let small = resize_nearest(
        bitmap,
        width.div_ceil(block_size),
        height.div_ceil(block_size),
    )?;
    resize_nearest(&small, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(width: u32, height: u32) -> Bitmap {
        let pixels = (0..width * height * 4)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
            .collect();
        Bitmap::from_rgba(width, height, pixels).unwrap()
    }

    #[test]
    fn test_uniform_blocks() {
        let out = pixelate(&noise(100, 100), 10).unwrap();
        assert_eq!(out.dimensions(), (100, 100));

        for by in 0..10 {
            for bx in 0..10 {
                let expected = out.pixel(bx * 10, by * 10);
                for y in 0..10 {
                    for x in 0..10 {
                        assert_eq!(out.pixel(bx * 10 + x, by * 10 + y), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_uneven_dimensions_keep_size() {
        let out = pixelate(&noise(23, 17), 5).unwrap();
        assert_eq!(out.dimensions(), (23, 17));
    }

    #[test]
    fn test_block_larger_than_image() {
        let img = noise(6, 4);
        let out = pixelate(&img, 50).unwrap();
        let first = out.pixel(0, 0);
        assert!(out.pixels().chunks_exact(4).all(|px| px == first));
    }

    #[test]
    fn test_block_size_bounds() {
        let img = noise(4, 4);
        assert_eq!(pixelate(&img, 1).unwrap(), img);
        assert!(pixelate(&img, 0).is_err());
    }
}
