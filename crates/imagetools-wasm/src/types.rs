//! Bitmap handles shared between JS and the pipeline.
//!
//! This module provides JavaScript-friendly types that wrap the core
//! ImageTools types, handling the conversion between Rust and JavaScript
//! data representations.

use imagetools_core::transform::FilterType;
use imagetools_core::{Bitmap, Rgb};
use wasm_bindgen::prelude::*;

use crate::to_js_error;

/// An RGBA bitmap held in WASM memory.
///
/// # Memory Management
///
/// The pixel data is stored in WASM memory. When you call `pixels()`, a copy
/// is made to JavaScript memory as a `Uint8Array`, ready for
/// `new ImageData(new Uint8ClampedArray(pixels), width, height)`.
///
/// The `free()` method can be called to explicitly release WASM memory, but
/// this is optional as wasm-bindgen's finalizer will handle cleanup
/// automatically.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsBitmap {
    inner: Bitmap,
}

#[wasm_bindgen]
impl JsBitmap {
    /// Create a bitmap from RGBA samples (4 bytes per pixel, row-major), e.g.
    /// the `data` of a canvas `ImageData`.
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero or the buffer length
    /// isn't `width * height * 4`.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsBitmap, JsValue> {
        Bitmap::from_rgba(width, height, pixels)
            .map(JsBitmap::from_bitmap)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    /// Number of bytes in the pixel buffer (`width * height * 4`).
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.pixels().len()
    }

    /// True if any pixel is not fully opaque.
    #[wasm_bindgen(getter)]
    pub fn has_transparency(&self) -> bool {
        self.inner.has_transparency()
    }

    /// Returns RGBA pixel data as Uint8Array.
    ///
    /// Note: This creates a copy of the pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.inner.pixels().to_vec()
    }

    /// Release the pixel buffer now instead of waiting for the JS finalizer.
    pub fn free(self) {}
}

impl JsBitmap {
    pub(crate) fn from_bitmap(inner: Bitmap) -> Self {
        Self { inner }
    }

    pub(crate) fn as_bitmap(&self) -> &Bitmap {
        &self.inner
    }

    pub(crate) fn into_bitmap(self) -> Bitmap {
        self.inner
    }
}

/// An ordered list of bitmaps, for the combiner, collage and splitter tools.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const list = new JsBitmapList();
/// list.push(first);
/// list.push(second);
/// const combined = combine_images(list, { type: 'row' });
/// ```
#[wasm_bindgen]
#[derive(Debug, Clone, Default)]
pub struct JsBitmapList {
    items: Vec<Bitmap>,
}

#[wasm_bindgen]
impl JsBitmapList {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsBitmapList {
        JsBitmapList::default()
    }

    /// Append a copy of `bitmap`.
    pub fn push(&mut self, bitmap: &JsBitmap) {
        self.items.push(bitmap.as_bitmap().clone());
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.items.len()
    }

    /// A copy of the bitmap at `index`, or `undefined` past the end.
    pub fn get(&self, index: usize) -> Option<JsBitmap> {
        self.items.get(index).cloned().map(JsBitmap::from_bitmap)
    }
}

impl JsBitmapList {
    pub(crate) fn from_bitmaps(items: Vec<Bitmap>) -> Self {
        Self { items }
    }

    pub(crate) fn as_slice(&self) -> &[Bitmap] {
        &self.items
    }
}

/// Resampling filter from the numeric code the tool pages send:
/// 0 nearest, 2 Lanczos3, anything else bilinear.
pub(crate) fn filter_from_u8(value: u8) -> FilterType {
    match value {
        0 => FilterType::Nearest,
        2 => FilterType::Lanczos3,
        _ => FilterType::Bilinear,
    }
}

/// Parse a `#RGB` / `#RRGGBB` color from a color picker.
pub(crate) fn parse_color(hex: &str) -> Result<Rgb, JsValue> {
    Rgb::parse_hex(hex).map_err(to_js_error)
}
