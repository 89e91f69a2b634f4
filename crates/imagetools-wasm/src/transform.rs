//! WASM bindings for geometric operations.
//!
//! Crop, rotate, flip, resize, split, combine, collage, masks and borders.
//! Every function returns a new bitmap and leaves its input untouched.

use imagetools_core::transform::{self as core, Layout, PercentRect, Ring};
use imagetools_core::{Bitmap, PipelineConfig};
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::{filter_from_u8, parse_color, JsBitmap, JsBitmapList};

/// Crop a pixel rectangle.
///
/// # Errors
///
/// Returns an error if the rectangle is empty or not fully inside the image.
#[wasm_bindgen]
pub fn apply_crop(
    image: &JsBitmap,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<JsBitmap, JsValue> {
    core::crop(image.as_bitmap(), x, y, width, height)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Crop using percentages (0-100) of the image size, as a crop box UI
/// reports them. The rectangle is clamped to the image.
///
/// # Example (TypeScript)
///
/// ```typescript
/// // Crop the center 50% of the image
/// const cropped = apply_crop_percent(image, 25, 25, 50, 50);
/// ```
#[wasm_bindgen]
pub fn apply_crop_percent(
    image: &JsBitmap,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Result<JsBitmap, JsValue> {
    let bitmap = image.as_bitmap();
    let (px, py, pw, ph) =
        PercentRect::new(x, y, width, height).to_pixels(bitmap.width(), bitmap.height());
    apply_crop(image, px, py, pw, ph)
}

/// Rotate around the center by any angle.
///
/// The canvas grows to fit the rotated image and uncovered corners are
/// transparent. Multiples of 90° are lossless.
///
/// # Arguments
///
/// * `image` - Source image to rotate
/// * `degrees` - Rotation angle in degrees (positive = clockwise)
/// * `filter` - 0=Nearest, 1=Bilinear, 2=Lanczos3
///
/// # Example (TypeScript)
///
/// ```typescript
/// const preview = apply_rotation(image, 15, 1);
/// const exported = apply_rotation(image, 15, 2);
/// ```
#[wasm_bindgen]
pub fn apply_rotation(image: &JsBitmap, degrees: f64, filter: u8) -> Result<JsBitmap, JsValue> {
    core::apply_rotation(image.as_bitmap(), degrees, filter_from_u8(filter))
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Mirror horizontally, vertically, or both.
#[wasm_bindgen]
pub fn apply_flip(image: &JsBitmap, horizontal: bool, vertical: bool) -> JsBitmap {
    JsBitmap::from_bitmap(core::flip(image.as_bitmap(), horizontal, vertical))
}

/// Resize to exact dimensions.
///
/// # Errors
///
/// Returns an error if width or height is zero.
#[wasm_bindgen]
pub fn apply_resize(
    image: &JsBitmap,
    width: u32,
    height: u32,
    filter: u8,
) -> Result<JsBitmap, JsValue> {
    core::resize(image.as_bitmap(), width, height, filter_from_u8(filter))
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Scale both dimensions by `factor` (the upscaler uses 2 or 4).
#[wasm_bindgen]
pub fn apply_scale(image: &JsBitmap, factor: f64, filter: u8) -> Result<JsBitmap, JsValue> {
    core::scale(image.as_bitmap(), factor, filter_from_u8(filter))
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Resize so the longer edge is at most `max_edge`, keeping the aspect
/// ratio. Smaller images are returned unchanged.
#[wasm_bindgen]
pub fn resize_to_fit(image: &JsBitmap, max_edge: u32, filter: u8) -> Result<JsBitmap, JsValue> {
    core::resize_to_fit(image.as_bitmap(), max_edge, filter_from_u8(filter))
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Cut an image into `rows × cols` tiles, row-major.
///
/// The last row and column absorb the remainder pixels.
#[wasm_bindgen]
pub fn split_image(image: &JsBitmap, rows: u32, cols: u32) -> Result<JsBitmapList, JsValue> {
    let tiles = core::split(image.as_bitmap(), rows, cols).map_err(to_js_error)?;
    Ok(JsBitmapList::from_bitmaps(
        tiles.into_iter().map(|tile| tile.bitmap).collect(),
    ))
}

/// Join images side by side or stacked.
///
/// `layout` is `{ type: 'row' }`, `{ type: 'column' }` or
/// `{ type: 'grid', columns, cell_size }`. Uses the default collage
/// background and filter; `JsToolSession.combine_images` uses the session's.
#[wasm_bindgen]
pub fn combine_images(images: &JsBitmapList, layout: JsValue) -> Result<JsBitmap, JsValue> {
    combine_with(images.as_slice(), &parse_layout(layout)?, &PipelineConfig::default())
}

/// Grid collage with `columns` square cells across the default canvas
/// width; every image is cover-fit into its cell on a white background.
#[wasm_bindgen]
pub fn make_collage(images: &JsBitmapList, columns: u32) -> Result<JsBitmap, JsValue> {
    collage_with(images.as_slice(), columns, &PipelineConfig::default())
}

pub(crate) fn parse_layout(layout: JsValue) -> Result<Layout, JsValue> {
    serde_wasm_bindgen::from_value(layout).map_err(|e| to_js_error(format!("Invalid layout: {e}")))
}

pub(crate) fn combine_with(
    images: &[Bitmap],
    layout: &Layout,
    config: &PipelineConfig,
) -> Result<JsBitmap, JsValue> {
    let (width, height) = core::combined_size(images, layout);
    config
        .check_output_size("images", width, height)
        .map_err(to_js_error)?;
    core::combine(
        images,
        layout,
        config.collage_background,
        config.resample_filter,
    )
    .map(JsBitmap::from_bitmap)
    .map_err(to_js_error)
}

/// Grid collage whose cells split `config.collage_width` into `columns`.
pub(crate) fn collage_with(
    images: &[Bitmap],
    columns: u32,
    config: &PipelineConfig,
) -> Result<JsBitmap, JsValue> {
    let layout = Layout::Grid {
        columns,
        cell_size: config.collage_cell_size(columns),
    };
    combine_with(images, &layout, config)
}

/// Center-crop to a circle; `ring_width` 0 draws no ring.
#[wasm_bindgen]
pub fn circle_mask(
    image: &JsBitmap,
    ring_width: u32,
    ring_color: Option<String>,
) -> Result<JsBitmap, JsValue> {
    let ring = match (ring_width, ring_color) {
        (0, _) | (_, None) => None,
        (width, Some(hex)) => Some(Ring {
            width,
            color: parse_color(&hex)?,
        }),
    };
    Ok(JsBitmap::from_bitmap(core::circle_mask(image.as_bitmap(), ring)))
}

/// Round the corners; `radius_percent` 100 gives the largest radius.
#[wasm_bindgen]
pub fn rounded_corners(image: &JsBitmap, radius_percent: f64) -> Result<JsBitmap, JsValue> {
    core::rounded_corners(image.as_bitmap(), radius_percent)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Surround the image with a solid border of `width` pixels.
#[wasm_bindgen]
pub fn add_border(image: &JsBitmap, width: u32, color: &str) -> Result<JsBitmap, JsValue> {
    let color = parse_color(color)?;
    core::add_border(image.as_bitmap(), width, color)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagetools_core::Bitmap;

    /// Create a simple test image.
    fn test_image(width: u32, height: u32) -> JsBitmap {
        let pixels: Vec<u8> = (0..(width * height * 4) as usize)
            .map(|i| (i % 256) as u8)
            .collect();
        JsBitmap::from_bitmap(Bitmap::from_rgba(width, height, pixels).unwrap())
    }

    fn opaque(width: u32, height: u32) -> JsBitmap {
        JsBitmap::from_bitmap(Bitmap::filled(width, height, [200, 100, 50, 255]))
    }

    #[test]
    fn test_rotation_no_change() {
        let img = test_image(100, 100);
        let result = apply_rotation(&img, 0.0, 1).unwrap();
        assert_eq!(result.pixels(), img.pixels());
    }

    #[test]
    fn test_rotation_90_degrees() {
        let img = test_image(100, 50);
        let result = apply_rotation(&img, 90.0, 1).unwrap();
        assert_eq!((result.width(), result.height()), (50, 100));
    }

    #[test]
    fn test_rotation_45_degrees_expands() {
        let img = opaque(100, 100);
        let result = apply_rotation(&img, 45.0, 1).unwrap();
        assert!(result.width() > 100);
        assert!(result.height() > 100);
        assert!(result.has_transparency());
    }

    #[test]
    fn test_crop_pixels() {
        let img = test_image(100, 200);
        let result = apply_crop(&img, 0, 0, 50, 50).unwrap();
        assert_eq!((result.width(), result.height()), (50, 50));
        assert_eq!(&result.pixels()[..8], &img.pixels()[..8]);
    }

    #[test]
    fn test_crop_percent_center() {
        let img = test_image(100, 100);
        let result = apply_crop_percent(&img, 25.0, 25.0, 50.0, 50.0).unwrap();
        assert_eq!((result.width(), result.height()), (50, 50));
    }

    #[test]
    fn test_flip_twice_is_identity() {
        let img = test_image(7, 5);
        let twice = apply_flip(&apply_flip(&img, true, true), true, true);
        assert_eq!(twice.pixels(), img.pixels());
    }

    #[test]
    fn test_resize_and_scale() {
        let img = test_image(40, 20);
        let resized = apply_resize(&img, 13, 7, 2).unwrap();
        assert_eq!((resized.width(), resized.height()), (13, 7));

        let scaled = apply_scale(&img, 2.0, 0).unwrap();
        assert_eq!((scaled.width(), scaled.height()), (80, 40));

        let fitted = resize_to_fit(&img, 10, 1).unwrap();
        assert_eq!((fitted.width(), fitted.height()), (10, 5));
    }

    #[test]
    fn test_split_then_collage() {
        let img = test_image(10, 10);
        let tiles = split_image(&img, 2, 2).unwrap();
        assert_eq!(tiles.length(), 4);
        assert_eq!(tiles.get(3).unwrap().width(), 5);

        let collage = make_collage(&tiles, 2).unwrap();
        assert_eq!((collage.width(), collage.height()), (1200, 1200));
    }

    #[test]
    fn test_circle_mask_without_ring() {
        let img = opaque(30, 20);
        let result = circle_mask(&img, 0, None).unwrap();
        assert_eq!((result.width(), result.height()), (20, 20));
        assert!(result.has_transparency());
    }

    #[test]
    fn test_border() {
        let img = test_image(4, 4);
        let result = add_border(&img, 3, "#000000").unwrap();
        assert_eq!((result.width(), result.height()), (10, 10));
        assert_eq!(&result.pixels()[..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn test_rounded_corners() {
        let img = opaque(20, 20);
        let result = rounded_corners(&img, 100.0).unwrap();
        assert_eq!(result.as_bitmap().pixel(0, 0)[3], 0);
        assert_eq!(result.as_bitmap().pixel(10, 10), [200, 100, 50, 255]);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn image(width: u32, height: u32) -> JsBitmap {
        JsBitmap::new(width, height, vec![255; (width * height * 4) as usize]).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_crop_out_of_bounds() {
        assert!(apply_crop(&image(10, 10), 5, 5, 10, 10).is_err());
    }

    #[wasm_bindgen_test]
    fn test_combine_row_from_js_layout() {
        let mut list = JsBitmapList::new();
        list.push(&image(3, 2));
        list.push(&image(4, 5));
        let layout = serde_wasm_bindgen::to_value(&Layout::Row).unwrap();
        let combined = combine_images(&list, layout).unwrap();
        assert_eq!((combined.width(), combined.height()), (7, 5));
    }

    #[wasm_bindgen_test]
    fn test_combine_rejects_bad_layout() {
        let list = JsBitmapList::new();
        assert!(combine_images(&list, JsValue::from_str("diagonal")).is_err());
    }

    #[wasm_bindgen_test]
    fn test_circle_mask_with_ring() {
        let result = circle_mask(&image(20, 20), 2, Some("#ff0000".into())).unwrap();
        assert_eq!(result.width(), 20);
    }
}
