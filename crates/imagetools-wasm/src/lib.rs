//! ImageTools WASM - WebAssembly bindings for ImageTools
//!
//! This crate exposes the imagetools-core pipeline to the browser tool
//! pages.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for bitmaps
//! - `decode` - Decoding uploads and reading EXIF metadata
//! - `transform` - Geometric operations (crop, rotate, resize, split, combine, masks)
//! - `filters` - Pixel-level operations (grayscale, blur, color key, ...)
//! - `compose` - Text, meme captions and image overlays
//! - `encode` - Export to JPEG/PNG/WebP/AVIF
//! - `session` - Per-tool session with stale-render protection
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsToolSession } from '@imagetools/wasm';
//!
//! await init();
//!
//! const session = new JsToolSession();
//! session.load(new Uint8Array(await file.arrayBuffer()), file.type);
//! session.set_spec([{ op: 'rotate', degrees: 90 }]);
//! session.render();
//! const out = session.export();
//! download(out.bytes(), session.export_filename(file.name, 'rotated'));
//! ```

use std::fmt::Display;

use wasm_bindgen::prelude::*;

mod compose;
mod decode;
mod encode;
mod filters;
mod session;
mod transform;
mod types;

pub use compose::{composite_image, draw_text, meme_text, JsFont};
pub use decode::{decode_image, detect_format, load_rgba, read_metadata};
pub use encode::{encode_image, export_filename, to_data_url, JsEncodedImage};
pub use filters::{
    apply_blur, apply_brightness, apply_color_key, apply_contrast, apply_grayscale, apply_invert,
    apply_pixelate, apply_sepia, apply_threshold, flatten,
};
pub use session::{JsInvocation, JsToolSession};
pub use transform::{
    add_border, apply_crop, apply_crop_percent, apply_flip, apply_resize, apply_rotation,
    apply_scale, circle_mask, combine_images, make_collage, resize_to_fit, rounded_corners,
    split_image,
};
pub use types::{JsBitmap, JsBitmapList};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Convert an error into a `JsValue` and log it to the browser console.
pub(crate) fn to_js_error(err: impl Display) -> JsValue {
    let value = JsValue::from_str(&err.to_string());
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&value);
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}
