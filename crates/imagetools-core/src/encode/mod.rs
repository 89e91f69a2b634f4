//! Image encoding for export.
//!
//! This module provides functionality for:
//! - Encoding bitmaps to JPEG, PNG, WebP and (with the `avif` feature) AVIF
//! - Describing the result (MIME type, extension, byte size, `data:` URI)
//! - Suggesting download file names
//!
//! Encoding never writes to the filesystem; the caller hands the bytes to
//! the browser download.
//!
//! # Examples
//!
//! ```ignore
//! use imagetools_core::encode::{encode, OutputFormat, OutputSpec};
//!
//! let spec = OutputSpec::new(OutputFormat::Jpeg, 0.8)?;
//! let encoded = encode(&bitmap, &spec, Rgb::WHITE)?;
//! println!("{} bytes of {}", encoded.len(), encoded.mime_type());
//! ```

mod avif;
mod jpeg;
mod png;
mod types;
mod webp;

use tracing::debug;

use crate::bitmap::Bitmap;
use crate::color::Rgb;

pub use avif::encode_avif;
pub use jpeg::encode_jpeg;
pub use png::encode_png;
pub use types::{
    data_url, export_filename, format_size, EncodeError, EncodedImage, OutputFormat, OutputSpec,
    DEFAULT_QUALITY,
};
pub use webp::encode_webp;

/// Encode a bitmap according to `spec`.
///
/// `background` is used only by formats without alpha (JPEG).
///
/// # Errors
///
/// `EncodeError::UnsupportedFormat` when the build can't produce the format,
/// `EncodeError::EncodingFailed` when the encoder itself fails.
pub fn encode(
    bitmap: &Bitmap,
    spec: &OutputSpec,
    background: Rgb,
) -> Result<EncodedImage, EncodeError> {
    let format = spec.format();
    let bytes = match format {
        OutputFormat::Jpeg => encode_jpeg(bitmap, spec.quality_percent(), background)?,
        OutputFormat::Png => encode_png(bitmap)?,
        OutputFormat::WebP => encode_webp(bitmap)?,
        OutputFormat::Avif => encode_avif(bitmap, spec.quality_percent())?,
    };

    debug!(
        %format,
        quality = spec.quality(),
        width = bitmap.width(),
        height = bitmap.height(),
        bytes = bytes.len(),
        "encoded image"
    );
    Ok(EncodedImage::new(bytes, format))
}
