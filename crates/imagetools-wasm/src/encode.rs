//! Image encoding WASM bindings.
//!
//! # Functions
//!
//! - [`encode_image`] - Encode a bitmap as JPEG, PNG, WebP or AVIF
//! - [`to_data_url`] - Render any bytes as a `data:` URI (image-to-Base64 tool)
//! - [`export_filename`] - Suggested download name
//!
//! # Example
//!
//! ```typescript
//! import { encode_image, export_filename } from '@imagetools/wasm';
//!
//! const out = encode_image(image, 'webp', 0.8);
//! const blob = new Blob([out.bytes()], { type: out.mime_type });
//! saveAs(blob, export_filename(file.name, 'converted', 'webp'));
//! console.log(`Compressed to ${out.size_label}`);
//! ```

use imagetools_core::encode::{self, EncodedImage, OutputFormat, OutputSpec};
use imagetools_core::PipelineConfig;
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::JsBitmap;

/// Encoded bytes plus the details the download needs.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsEncodedImage {
    inner: EncodedImage,
}

#[wasm_bindgen]
impl JsEncodedImage {
    /// Returns the encoded bytes as Uint8Array (a copy).
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes().to_vec()
    }

    #[wasm_bindgen(getter)]
    pub fn mime_type(&self) -> String {
        self.inner.mime_type().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn extension(&self) -> String {
        self.inner.extension().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.len()
    }

    /// Human-readable size, e.g. "1.40 MB", for the compressor readout.
    #[wasm_bindgen(getter)]
    pub fn size_label(&self) -> String {
        encode::format_size(self.inner.len())
    }

    pub fn to_data_url(&self) -> String {
        self.inner.to_data_url()
    }
}

impl JsEncodedImage {
    pub(crate) fn from_encoded(inner: EncodedImage) -> Self {
        Self { inner }
    }
}

fn parse_format(format: &str) -> Result<OutputFormat, JsValue> {
    format.parse::<OutputFormat>().map_err(to_js_error)
}

/// Encode a bitmap for download.
///
/// # Arguments
///
/// * `format` - "jpeg", "png", "webp" or "avif" (MIME types and extensions work too)
/// * `quality` - 0.0 to 1.0, like `canvas.toBlob`; ignored by PNG and WebP
///
/// JPEG has no alpha, so transparent pixels are flattened onto white.
///
/// # Errors
///
/// Returns an error for an unknown format, a quality outside `[0, 1]`, or
/// AVIF in a build without AVIF support.
#[wasm_bindgen]
pub fn encode_image(
    image: &JsBitmap,
    format: &str,
    quality: f32,
) -> Result<JsEncodedImage, JsValue> {
    let spec = OutputSpec::new(parse_format(format)?, quality).map_err(to_js_error)?;
    encode::encode(
        image.as_bitmap(),
        &spec,
        PipelineConfig::default().flatten_background,
    )
    .map(JsEncodedImage::from_encoded)
    .map_err(to_js_error)
}

/// `data:<mime>;base64,...` for arbitrary bytes.
#[wasm_bindgen]
pub fn to_data_url(bytes: &[u8], mime_type: &str) -> String {
    encode::data_url(bytes, mime_type)
}

/// `<stem>-<suffix>.<ext>` for the chosen format, e.g. `cat-resized.webp`.
#[wasm_bindgen]
pub fn export_filename(original: &str, suffix: &str, format: &str) -> Result<String, JsValue> {
    Ok(encode::export_filename(original, suffix, parse_format(format)?))
}
