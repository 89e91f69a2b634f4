//! Joining several images into one (the combiner and collage tools).

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{resize, FilterType};
use crate::bitmap::Bitmap;
use crate::color::Rgb;
use crate::compose::{copy_into, draw_over};
use crate::error::{PipelineError, Result};

/// How the images are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Layout {
    /// Side by side, top aligned. Canvas is `sum(widths) × max(heights)`.
    Row,
    /// Stacked, left aligned. Canvas is `max(widths) × sum(heights)`.
    Column,
    /// Square cells of `cell_size`, `columns` per row, images cover-fit.
    Grid { columns: u32, cell_size: u32 },
}

/// Combine images according to `layout`.
///
/// Row and column layouts leave uncovered canvas transparent. Grid layouts
/// fill the canvas with `background` and cover-fit each image into its cell:
/// scaled by `max(cell / w, cell / h)`, centered and clipped to the cell.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` for an empty image list, a grid
/// with zero columns or zero cell size, or a canvas too large to address.
pub fn combine(
    images: &[Bitmap],
    layout: &Layout,
    background: Rgb,
    filter: FilterType,
) -> Result<Bitmap> {
    if images.is_empty() {
        return Err(PipelineError::invalid("images", "at least one image is required"));
    }

    let size = combined_size(images, layout);
    let output = match *layout {
        Layout::Row => {
            let (width, height) = Bitmap::ensure_allocatable("images", size.0, size.1)?;
            let mut canvas = Bitmap::transparent(width, height);
            let mut x = 0;
            for image in images {
                copy_into(&mut canvas, image, x, 0);
                x += image.width();
            }
            canvas
        }
        Layout::Column => {
            let (width, height) = Bitmap::ensure_allocatable("images", size.0, size.1)?;
            let mut canvas = Bitmap::transparent(width, height);
            let mut y = 0;
            for image in images {
                copy_into(&mut canvas, image, 0, y);
                y += image.height();
            }
            canvas
        }
        Layout::Grid { columns, cell_size } => {
            grid(images, columns, cell_size, size, background, filter)?
        }
    };

    debug!(
        count = images.len(),
        ?layout,
        width = output.width(),
        height = output.height(),
        "combined images"
    );
    Ok(output)
}

/// Canvas size [`combine`] produces for `images` under `layout`, computed
/// without allocating.
pub fn combined_size(images: &[Bitmap], layout: &Layout) -> (u64, u64) {
    let widths = images.iter().map(|b| u64::from(b.width()));
    let heights = images.iter().map(|b| u64::from(b.height()));
    match *layout {
        Layout::Row => (widths.sum(), heights.max().unwrap_or(1)),
        Layout::Column => (widths.max().unwrap_or(1), heights.sum()),
        Layout::Grid { columns, cell_size } => {
            let rows = (images.len() as u64).div_ceil(u64::from(columns.max(1)));
            let cell = u64::from(cell_size);
            (u64::from(columns) * cell, rows * cell)
        }
    }
}

fn grid(
    images: &[Bitmap],
    columns: u32,
    cell_size: u32,
    size: (u64, u64),
    background: Rgb,
    filter: FilterType,
) -> Result<Bitmap> {
    if columns == 0 {
        return Err(PipelineError::invalid("columns", "must be at least 1"));
    }
    if cell_size == 0 {
        return Err(PipelineError::invalid("cell_size", "must be at least 1"));
    }

    let (width, height) = Bitmap::ensure_allocatable("cell_size", size.0, size.1)?;

    let mut canvas = Bitmap::filled(width, height, background.to_rgba());
    for (i, image) in images.iter().enumerate() {
        let i = i as u32;
        let cell_x = (i % columns) * cell_size;
        let cell_y = (i / columns) * cell_size;
        let cell = cover_fit(image, cell_size, filter)?;
        draw_over(&mut canvas, &cell, cell_x as i64, cell_y as i64);
    }
    Ok(canvas)
}

/// Scale `image` to cover a `cell × cell` square, then center-crop to it.
fn cover_fit(image: &Bitmap, cell: u32, filter: FilterType) -> Result<Bitmap> {
    let (w, h) = (image.width() as f64, image.height() as f64);
    let scale = (cell as f64 / w).max(cell as f64 / h);
    let scaled_w = ((w * scale).round() as u32).max(cell);
    let scaled_h = ((h * scale).round() as u32).max(cell);

    let scaled = resize(image, scaled_w, scaled_h, filter)?;
    let x = (scaled_w - cell) / 2;
    let y = (scaled_h - cell) / 2;
    Ok(scaled.copy_region(x, y, cell, cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    #[test]
    fn test_row_layout() {
        let a = Bitmap::filled(3, 2, RED);
        let b = Bitmap::filled(4, 5, BLUE);
        let out = combine(&[a, b], &Layout::Row, Rgb::WHITE, FilterType::Bilinear).unwrap();

        assert_eq!(out.dimensions(), (7, 5));
        assert_eq!(out.pixel(0, 0), RED);
        assert_eq!(out.pixel(3, 4), BLUE);
        // Below the shorter image stays transparent
        assert_eq!(out.pixel(0, 4)[3], 0);
    }

    #[test]
    fn test_column_layout() {
        let a = Bitmap::filled(3, 2, RED);
        let b = Bitmap::filled(4, 5, BLUE);
        let out = combine(&[a, b], &Layout::Column, Rgb::WHITE, FilterType::Bilinear).unwrap();

        assert_eq!(out.dimensions(), (4, 7));
        assert_eq!(out.pixel(0, 0), RED);
        assert_eq!(out.pixel(3, 0)[3], 0);
        assert_eq!(out.pixel(3, 6), BLUE);
    }

    #[test]
    fn test_grid_of_three() {
        let images = vec![
            Bitmap::filled(10, 10, RED),
            Bitmap::filled(10, 10, RED),
            Bitmap::filled(10, 10, BLUE),
        ];
        let layout = Layout::Grid {
            columns: 2,
            cell_size: 8,
        };
        let out = combine(&images, &layout, Rgb::WHITE, FilterType::Bilinear).unwrap();

        assert_eq!(out.dimensions(), (16, 16));
        // Third image is the first cell of row two
        assert_eq!(out.pixel(0, 8), BLUE);
        assert_eq!(out.pixel(7, 15), BLUE);
        // The empty cell shows the background
        assert_eq!(out.pixel(12, 12), [255, 255, 255, 255]);
    }

    #[test]
    fn test_grid_cover_fit_crops_center() {
        // Wide image: left third red, middle blue, right third red
        let mut pixels = Vec::new();
        for _y in 0..10 {
            for x in 0..30 {
                pixels.extend_from_slice(if (10..20).contains(&x) { &BLUE } else { &RED });
            }
        }
        let wide = Bitmap::from_rgba(30, 10, pixels).unwrap();
        let layout = Layout::Grid {
            columns: 1,
            cell_size: 10,
        };
        let out = combine(&[wide], &layout, Rgb::WHITE, FilterType::Nearest).unwrap();

        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.pixels().chunks_exact(4).all(|px| px == BLUE));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(combine(&[], &Layout::Row, Rgb::WHITE, FilterType::Bilinear).is_err());
        let one = [Bitmap::filled(1, 1, RED)];
        let layout = Layout::Grid {
            columns: 0,
            cell_size: 10,
        };
        assert!(combine(&one, &layout, Rgb::WHITE, FilterType::Bilinear).is_err());
    }

    #[test]
    fn test_combined_size() {
        let images = [Bitmap::filled(3, 2, RED), Bitmap::filled(4, 5, BLUE)];
        assert_eq!(combined_size(&images, &Layout::Row), (7, 5));
        assert_eq!(combined_size(&images, &Layout::Column), (4, 7));
        let grid = Layout::Grid {
            columns: 3,
            cell_size: 10,
        };
        assert_eq!(combined_size(&images, &grid), (30, 10));
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let one = [Bitmap::filled(1, 1, RED)];
        let layout = Layout::Grid {
            columns: 4,
            cell_size: u32::MAX,
        };
        let result = combine(&one, &layout, Rgb::WHITE, FilterType::Bilinear);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidParameter { name: "cell_size", .. })
        ));
    }

    #[test]
    fn test_layout_deserialize() {
        let layout: Layout =
            serde_json::from_str(r#"{"type": "grid", "columns": 3, "cell_size": 400}"#).unwrap();
        assert_eq!(
            layout,
            Layout::Grid {
                columns: 3,
                cell_size: 400
            }
        );
    }
}
