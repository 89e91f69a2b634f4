//! Pixel filter WASM bindings.
//!
//! These back the filter, blur, black-and-white and transparent-background
//! tools. Dimensions never change.

use imagetools_core::compose;
use imagetools_core::filter;
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::{parse_color, JsBitmap};

#[wasm_bindgen]
pub fn apply_grayscale(image: &JsBitmap) -> JsBitmap {
    JsBitmap::from_bitmap(filter::grayscale(image.as_bitmap()))
}

#[wasm_bindgen]
pub fn apply_sepia(image: &JsBitmap) -> JsBitmap {
    JsBitmap::from_bitmap(filter::sepia(image.as_bitmap()))
}

#[wasm_bindgen]
pub fn apply_invert(image: &JsBitmap) -> JsBitmap {
    JsBitmap::from_bitmap(filter::invert(image.as_bitmap()))
}

/// Brightness in percent; 100 leaves the image unchanged.
#[wasm_bindgen]
pub fn apply_brightness(image: &JsBitmap, percent: f64) -> Result<JsBitmap, JsValue> {
    filter::brightness(image.as_bitmap(), percent)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Contrast in percent; 100 leaves the image unchanged.
#[wasm_bindgen]
pub fn apply_contrast(image: &JsBitmap, percent: f64) -> Result<JsBitmap, JsValue> {
    filter::contrast(image.as_bitmap(), percent)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Gaussian blur. `amount` is relative to the image size, so a slider
/// position looks the same on a thumbnail and on the full image.
#[wasm_bindgen]
pub fn apply_blur(image: &JsBitmap, amount: f64) -> Result<JsBitmap, JsValue> {
    filter::blur(image.as_bitmap(), amount)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Black and white: pixels whose average channel is at least `level` turn
/// white, the rest black.
#[wasm_bindgen]
pub fn apply_threshold(image: &JsBitmap, level: u8) -> JsBitmap {
    JsBitmap::from_bitmap(filter::threshold(image.as_bitmap(), level))
}

/// Make pixels near `color` transparent.
///
/// # Arguments
///
/// * `color` - Target color as `#RGB` or `#RRGGBB`
/// * `tolerance_percent` - 0 removes exact matches only, 100 removes everything
#[wasm_bindgen]
pub fn apply_color_key(
    image: &JsBitmap,
    color: &str,
    tolerance_percent: f64,
) -> Result<JsBitmap, JsValue> {
    let target = parse_color(color)?;
    filter::color_key(image.as_bitmap(), target, tolerance_percent)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Mosaic with square blocks of `block_size` pixels.
#[wasm_bindgen]
pub fn apply_pixelate(image: &JsBitmap, block_size: u32) -> Result<JsBitmap, JsValue> {
    filter::pixelate(image.as_bitmap(), block_size)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Composite onto an opaque background color.
#[wasm_bindgen]
pub fn flatten(image: &JsBitmap, background: &str) -> Result<JsBitmap, JsValue> {
    let background = parse_color(background)?;
    Ok(JsBitmap::from_bitmap(compose::flatten(
        image.as_bitmap(),
        background,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagetools_core::Bitmap;

    fn two_tone() -> JsBitmap {
        let mut pixels = Vec::new();
        for i in 0..16 {
            let v = if i % 2 == 0 { 255 } else { 0 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
        JsBitmap::from_bitmap(Bitmap::from_rgba(4, 4, pixels).unwrap())
    }

    #[test]
    fn test_color_key_removes_white_keeps_black() {
        let out = apply_color_key(&two_tone(), "#ffffff", 20.0).unwrap();
        let px = out.pixels();
        assert_eq!(px[3], 0);
        assert_eq!(&px[4..8], &[0, 0, 0, 255]);
    }

    #[test]
    fn test_threshold_is_binary() {
        let img = JsBitmap::from_bitmap(Bitmap::filled(3, 3, [90, 140, 200, 255]));
        let out = apply_threshold(&img, 128);
        assert!(out.pixels().iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn test_invert_and_grayscale() {
        let img = JsBitmap::from_bitmap(Bitmap::filled(1, 1, [10, 20, 30, 255]));
        assert_eq!(apply_invert(&img).pixels(), vec![245, 235, 225, 255]);

        let gray = apply_grayscale(&img).pixels();
        assert_eq!(gray[0], gray[1]);
        assert_eq!(gray[1], gray[2]);
    }

    #[test]
    fn test_identity_adjustments() {
        let img = two_tone();
        assert_eq!(apply_brightness(&img, 100.0).unwrap().pixels(), img.pixels());
        assert_eq!(apply_contrast(&img, 100.0).unwrap().pixels(), img.pixels());
        assert_eq!(apply_blur(&img, 0.0).unwrap().pixels(), img.pixels());
    }

    #[test]
    fn test_sepia_keeps_size() {
        let out = apply_sepia(&two_tone());
        assert_eq!((out.width(), out.height()), (4, 4));
    }

    #[test]
    fn test_pixelate_blocks() {
        let out = apply_pixelate(&two_tone(), 2).unwrap();
        let px = out.pixels();
        assert_eq!(&px[0..4], &px[4..8]);
    }

    #[test]
    fn test_flatten_removes_alpha() {
        let img = JsBitmap::from_bitmap(Bitmap::transparent(2, 2));
        let out = flatten(&img, "#000").unwrap();
        assert_eq!(&out.pixels()[..4], &[0, 0, 0, 255]);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use imagetools_core::Bitmap;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_invalid_parameters() {
        let img = JsBitmap::from_bitmap(Bitmap::filled(2, 2, [0, 0, 0, 255]));
        assert!(apply_pixelate(&img, 0).is_err());
        assert!(apply_color_key(&img, "#000", 150.0).is_err());
        assert!(apply_color_key(&img, "black", 10.0).is_err());
        assert!(apply_brightness(&img, -5.0).is_err());
    }
}
