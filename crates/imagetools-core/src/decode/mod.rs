//! Image decoding for the browser tools.
//!
//! This module provides functionality for:
//! - Sniffing the input container from magic bytes (with a MIME/extension fallback)
//! - Decoding JPEG, PNG, WebP and GIF into upright RGBA bitmaps
//! - Routing HEIC, PSD, TIFF and PDF to registered external decoders
//! - Reading EXIF metadata for the metadata viewer
//!
//! # Examples
//!
//! ```ignore
//! use imagetools_core::decode::decode_image;
//! use imagetools_core::PipelineConfig;
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let image = decode_image(&bytes, Some("image/jpeg"), &PipelineConfig::default()).unwrap();
//! println!("Decoded {}x{} {}", image.width(), image.height(), image.format());
//! ```

mod decoder;
mod external;
mod metadata;
mod types;

pub use decoder::{decode_image, extract_orientation};
pub use external::{
    DecodeRequest, DecoderRegistry, ExternalDecoder, ExternalOutput, ExternalToolError,
};
pub use metadata::read_metadata;
pub use types::{
    DecodeError, ExifField, ImageMetadata, InputFormat, Orientation, SourceImage,
};

#[cfg(test)]
pub(crate) use decoder::tests::encoded;
