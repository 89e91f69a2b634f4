//! Horizontal and vertical mirroring.

use crate::bitmap::{Bitmap, CHANNELS};

/// Mirror a bitmap's columns (`horizontal`) and/or rows (`vertical`).
///
/// Dimensions are unchanged and flipping twice restores the input.
pub fn flip(bitmap: &Bitmap, horizontal: bool, vertical: bool) -> Bitmap {
    if !horizontal && !vertical {
        return bitmap.clone();
    }

    let (width, height) = bitmap.dimensions();
    let row_bytes = width as usize * CHANNELS;
    let src = bitmap.pixels();
    let mut output = Vec::with_capacity(src.len());

    for y in 0..height as usize {
        let src_y = if vertical { height as usize - 1 - y } else { y };
        let row = &src[src_y * row_bytes..(src_y + 1) * row_bytes];
        if horizontal {
            for px in row.chunks_exact(CHANNELS).rev() {
                output.extend_from_slice(px);
            }
        } else {
            output.extend_from_slice(row);
        }
    }

    Bitmap::from_raw_parts(width, height, output)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: flipping twice on the same axes is the identity.
        #[test]
        fn prop_flip_is_involution(
            width in 1u32..20,
            height in 1u32..20,
            horizontal: bool,
            vertical: bool,
            seed: u8,
        ) {
            let pixels: Vec<u8> = (0..width * height * 4)
                .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                .collect();
            let img = Bitmap::from_rgba(width, height, pixels).unwrap();

            let twice = flip(&flip(&img, horizontal, vertical), horizontal, vertical);
            prop_assert_eq!(twice, img);
        }
    }
}
