//! Source-over alpha compositing.

use crate::bitmap::{Bitmap, CHANNELS};
use crate::color::Rgb;

/// Blend `top` over `bottom` (straight alpha, source-over).
#[inline]
pub fn blend_pixel(bottom: [u8; 4], top: [u8; 4]) -> [u8; 4] {
    match top[3] {
        255 => return top,
        0 => return bottom,
        _ => {}
    }

    let top_alpha = top[3] as f32 / 255.0;
    let bottom_alpha = bottom[3] as f32 / 255.0;
    let out_alpha = top_alpha + bottom_alpha * (1.0 - top_alpha);

    if out_alpha < 0.001 {
        return [0, 0, 0, 0];
    }

    let blend = |t: u8, b: u8| -> u8 {
        let result =
            (t as f32 * top_alpha + b as f32 * bottom_alpha * (1.0 - top_alpha)) / out_alpha;
        result.clamp(0.0, 255.0).round() as u8
    };

    [
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_alpha * 255.0).round() as u8,
    ]
}

/// Visible overlap of a `src_w × src_h` rectangle placed at `(x, y)` on the
/// destination: `(dst_x, dst_y, src_x, src_y, width, height)`.
fn clip(dst: &Bitmap, src: &Bitmap, x: i64, y: i64) -> Option<(u32, u32, u32, u32, u32, u32)> {
    let left = x.max(0);
    let top = y.max(0);
    let right = (x + src.width() as i64).min(dst.width() as i64);
    let bottom = (y + src.height() as i64).min(dst.height() as i64);
    if left >= right || top >= bottom {
        return None;
    }
    Some((
        left as u32,
        top as u32,
        (left - x) as u32,
        (top - y) as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

/// Composite `src` over `dst` with its top-left corner at `(x, y)`.
///
/// Parts of `src` outside `dst` are clipped.
pub fn draw_over(dst: &mut Bitmap, src: &Bitmap, x: i64, y: i64) {
    let Some((dst_x, dst_y, src_x, src_y, width, height)) = clip(dst, src, x, y) else {
        return;
    };

    for row in 0..height {
        for col in 0..width {
            let top = src.pixel(src_x + col, src_y + row);
            if top[3] == 0 {
                continue;
            }
            let bottom = dst.pixel(dst_x + col, dst_y + row);
            dst.put_pixel(dst_x + col, dst_y + row, blend_pixel(bottom, top));
        }
    }
}

/// Copy `src` into `dst` at `(x, y)`, replacing pixels (no blending).
pub fn copy_into(dst: &mut Bitmap, src: &Bitmap, x: u32, y: u32) {
    let Some((dst_x, dst_y, src_x, src_y, width, height)) = clip(dst, src, x as i64, y as i64)
    else {
        return;
    };

    let row_bytes = width as usize * CHANNELS;
    for row in 0..height {
        let from = src.index(src_x, src_y + row);
        let to = dst.index(dst_x, dst_y + row);
        dst.pixels_mut()[to..to + row_bytes]
            .copy_from_slice(&src.pixels()[from..from + row_bytes]);
    }
}

/// Composite a bitmap onto an opaque background color.
///
/// Every output pixel has alpha 255.
pub fn flatten(bitmap: &Bitmap, background: Rgb) -> Bitmap {
    let bg = background.to_rgba();
    let mut output = bitmap.clone();
    for px in output.pixels_mut().chunks_exact_mut(CHANNELS) {
        let blended = blend_pixel(bg, [px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&blended);
    }
    output
}
