//! Grid splitting (the image splitter tool).

use serde::Serialize;

use crate::bitmap::Bitmap;
use crate::error::{PipelineError, Result};

/// One tile of a split image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tile {
    /// Zero-based row index.
    pub row: u32,
    /// Zero-based column index.
    pub col: u32,
    /// Left edge of the tile in the source image.
    pub x: u32,
    /// Top edge of the tile in the source image.
    pub y: u32,
    #[serde(skip)]
    pub bitmap: Bitmap,
}

/// Split a bitmap into `rows × cols` tiles in row-major order.
///
/// Tiles are `floor(W / cols) × floor(H / rows)`; the last column and the
/// last row absorb the remainder pixels, so the tiles cover the source
/// exactly.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` when `rows` or `cols` is 0 or
/// larger than the image dimension it divides.
pub fn split(bitmap: &Bitmap, rows: u32, cols: u32) -> Result<Vec<Tile>> {
    let (width, height) = bitmap.dimensions();
    if rows == 0 || rows > height {
        return Err(PipelineError::invalid(
            "rows",
            format!("must be between 1 and the image height ({height}), got {rows}"),
        ));
    }
    if cols == 0 || cols > width {
        return Err(PipelineError::invalid(
            "cols",
            format!("must be between 1 and the image width ({width}), got {cols}"),
        ));
    }

    let tile_w = width / cols;
    let tile_h = height / rows;

    let mut tiles = Vec::with_capacity(rows as usize * cols as usize);
    for row in 0..rows {
        let y = row * tile_h;
        let h = if row == rows - 1 { height - y } else { tile_h };
        for col in 0..cols {
            let x = col * tile_w;
            let w = if col == cols - 1 { width - x } else { tile_w };
            tiles.push(Tile {
                row,
                col,
                x,
                y,
                bitmap: bitmap.copy_region(x, y, w, h),
            });
        }
    }

    Ok(tiles)
}
