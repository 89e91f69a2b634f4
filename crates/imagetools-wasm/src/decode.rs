//! Image decoding WASM bindings.
//!
//! # Functions
//!
//! - [`decode_image`] - Decode JPEG, PNG, WebP or GIF bytes into a bitmap
//! - [`load_rgba`] - Wrap canvas `ImageData` pixels without decoding
//! - [`detect_format`] - Name the container format of some bytes
//! - [`read_metadata`] - EXIF metadata for the metadata viewer
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, read_metadata } from '@imagetools/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = decode_image(bytes, file.type);
//! const meta = read_metadata(bytes, file.type);
//! console.log(`${image.width}x${image.height} from ${meta.camera_model ?? 'unknown camera'}`);
//! ```

use imagetools_core::decode::{self, InputFormat};
use imagetools_core::{Bitmap, PipelineConfig};
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::JsBitmap;

/// Decode an image from bytes.
///
/// The format is sniffed from the magic bytes; `hint` (a MIME type or file
/// name) is only consulted when sniffing fails. EXIF orientation is applied
/// so the result is upright. Use `JsToolSession.decode_image` to decode
/// under a session's limits instead of the defaults.
///
/// # Errors
///
/// Returns an error if the bytes are empty, truncated, corrupt, in a format
/// that needs an external decoder (HEIC, PSD, TIFF, PDF), or larger than the
/// default decode limits.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8], hint: Option<String>) -> Result<JsBitmap, JsValue> {
    decode_with(bytes, hint.as_deref(), &PipelineConfig::default())
}

pub(crate) fn decode_with(
    bytes: &[u8],
    hint: Option<&str>,
    config: &PipelineConfig,
) -> Result<JsBitmap, JsValue> {
    decode::decode_image(bytes, hint, config)
        .map(|source| JsBitmap::from_bitmap(source.bitmap().clone()))
        .map_err(to_js_error)
}

/// Wrap RGBA pixels read from a canvas.
///
/// Same as `new JsBitmap(width, height, pixels)`, kept as a free function for
/// the tools that draw an `<img>` to a canvas first.
#[wasm_bindgen]
pub fn load_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsBitmap, JsValue> {
    Bitmap::from_rgba(width, height, pixels)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Name of the detected container format ("JPEG", "HEIC", "unknown", ...).
#[wasm_bindgen]
pub fn detect_format(bytes: &[u8], hint: Option<String>) -> String {
    InputFormat::detect(bytes, hint.as_deref()).to_string()
}

/// Read dimensions and EXIF metadata.
///
/// Returns a plain object with `format`, `width`, `height`, `orientation`,
/// the common camera fields, and `fields` (every EXIF tag with its display
/// value).
///
/// # Errors
///
/// Returns an error if the bytes are empty or the header can't be read.
#[wasm_bindgen]
pub fn read_metadata(bytes: &[u8], hint: Option<String>) -> Result<JsValue, JsValue> {
    let metadata = decode::read_metadata(bytes, hint.as_deref()).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&metadata).map_err(to_js_error)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_decode_empty_fails() {
        assert!(decode_image(&[], Some("image/png".into())).is_err());
    }

    #[wasm_bindgen_test]
    fn test_decode_heic_needs_external_decoder() {
        assert!(decode_image(b"\0\0\0\x18ftypheic", None).is_err());
    }

    #[wasm_bindgen_test]
    fn test_read_metadata_returns_object() {
        let bytes = imagetools_core::encode::encode(
            &Bitmap::filled(3, 2, [0, 0, 0, 255]),
            &imagetools_core::encode::OutputSpec::png(),
            imagetools_core::Rgb::WHITE,
        )
        .unwrap()
        .into_bytes();
        let value = read_metadata(&bytes, None).unwrap();
        assert!(value.is_object());
    }
}
