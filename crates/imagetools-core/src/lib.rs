//! ImageTools Core - image processing library
//!
//! This crate provides the image pipeline behind the ImageTools browser
//! tools: decode an uploaded file, run it through an ordered list of
//! geometric, pixel-level and compositing stages, and re-encode it for
//! download.
//!
//! ```text
//! bytes ──decode──▶ SourceImage ──TransformSpec──▶ RenderedImage ──encode──▶ EncodedImage
//! ```
//!
//! The browser surface lives in `imagetools-wasm`; nothing here touches the
//! DOM or the filesystem.

pub mod bitmap;
pub mod color;
pub mod compose;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod session;
pub mod transform;

pub use bitmap::Bitmap;
pub use color::Rgb;
pub use config::PipelineConfig;
pub use decode::{decode_image, read_metadata, DecodeError, ImageMetadata, InputFormat, SourceImage};
pub use encode::{encode, EncodeError, EncodedImage, OutputFormat, OutputSpec};
pub use error::{PipelineError, Result};
pub use pipeline::{render, run_transforms, RenderedImage, StageContext, TransformOp, TransformSpec};
pub use session::{Invocation, InvocationToken, ToolSession};
pub use transform::{apply_rotation, combine, compute_rotated_bounds, crop, split, FilterType, Layout};
