use crate::bitmap::{Bitmap, CHANNELS};

/// Convert to pure black and white.
///
/// A pixel becomes white when the mean of its RGB channels is at least
/// `level`, black otherwise. Alpha is kept.
pub fn threshold(bitmap: &Bitmap, level: u8) -> Bitmap {
    let mut output = bitmap.clone();
    let cutoff = level as u32 * 3;
    for px in output.pixels_mut().chunks_exact_mut(CHANNELS) {
        let sum = px[0] as u32 + px[1] as u32 + px[2] as u32;
        let v = if sum >= cutoff { 255 } else { 0 };
        px[0] = v;
        px[1] = v;
        px[2] = v;
    }
    output
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: output color channels are only ever 0 or 255.
        #[test]
        fn prop_binary_output(
            pixels in prop::collection::vec(any::<u8>(), 4 * 16),
            level: u8,
        ) {
            let img = Bitmap::from_rgba(4, 4, pixels.clone()).unwrap();
            let out = threshold(&img, level);
            for (px, src) in out.pixels().chunks_exact(4).zip(pixels.chunks_exact(4)) {
                prop_assert!(px[..3].iter().all(|&v| v == 0 || v == 255));
                prop_assert_eq!(px[3], src[3]);
            }
        }
    }
}
