//! Delegation to decoders that live outside the pipeline.
//!
//! HEIC, PSD, TIFF and PDF (and tools like OCR or vectorization) are handled
//! by opaque third-party code. The pipeline only sees them through the
//! [`ExternalDecoder`] trait and routes bytes to them via a
//! [`DecoderRegistry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::{decode_image, DecodeError, InputFormat, SourceImage};
use crate::bitmap::Bitmap;
use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Failure reported by an external decoder.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ExternalToolError {
    pub message: String,
}

impl ExternalToolError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Per-call options for an external decoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeRequest {
    /// 1-based page for multi-page documents (PDF, multi-image TIFF).
    pub page: u32,
    /// Rasterization scale for vector documents.
    pub scale: f32,
}

impl Default for DecodeRequest {
    fn default() -> Self {
        Self {
            page: 1,
            scale: 1.0,
        }
    }
}

/// What an external tool hands back.
#[derive(Debug, Clone)]
pub enum ExternalOutput {
    /// A raster image ready for the transform stages.
    Bitmap(Bitmap),
    /// Vector markup (SVG) from a tracer.
    Vector(String),
    /// Extracted text (OCR, PDF text layer).
    Text(String),
}

impl ExternalOutput {
    fn kind(&self) -> &'static str {
        match self {
            ExternalOutput::Bitmap(_) => "bitmap",
            ExternalOutput::Vector(_) => "vector",
            ExternalOutput::Text(_) => "text",
        }
    }
}

/// A decoder implemented outside the pipeline.
///
/// `progress` receives fractions in `[0, 1]`; values outside that range are
/// clamped before they reach the caller. No timeout is imposed.
pub trait ExternalDecoder {
    /// Name used in error messages (e.g. "heic2any").
    fn name(&self) -> &str;

    /// Formats this decoder accepts.
    fn formats(&self) -> &[InputFormat];

    fn decode(
        &self,
        bytes: &[u8],
        request: &DecodeRequest,
        progress: &mut dyn FnMut(f32),
    ) -> Result<ExternalOutput, ExternalToolError>;
}

/// Maps input formats to registered external decoders.
#[derive(Default, Clone)]
pub struct DecoderRegistry {
    decoders: HashMap<InputFormat, Arc<dyn ExternalDecoder + Send + Sync>>,
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<String> = self.decoders.keys().map(|k| k.to_string()).collect();
        formats.sort();
        f.debug_struct("DecoderRegistry")
            .field("formats", &formats)
            .finish()
    }
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder for every format it reports. Later registrations
    /// replace earlier ones for the same format.
    pub fn register(&mut self, decoder: Arc<dyn ExternalDecoder + Send + Sync>) {
        for &format in decoder.formats() {
            self.decoders.insert(format, Arc::clone(&decoder));
        }
    }

    pub fn get(&self, format: InputFormat) -> Option<&(dyn ExternalDecoder + Send + Sync)> {
        self.decoders.get(&format).map(|d| d.as_ref())
    }

    pub fn supports(&self, format: InputFormat) -> bool {
        format.is_builtin() || self.decoders.contains_key(&format)
    }

    /// Run the registered decoder for `format` and return its raw output.
    ///
    /// # Errors
    ///
    /// `Decode(Unsupported)` when no decoder is registered, and
    /// `ExternalToolFailure` when the decoder itself fails.
    pub fn run(
        &self,
        format: InputFormat,
        bytes: &[u8],
        request: &DecodeRequest,
        progress: &mut dyn FnMut(f32),
    ) -> Result<ExternalOutput, PipelineError> {
        let decoder = self
            .get(format)
            .ok_or(DecodeError::Unsupported { format })?;

        debug!(%format, tool = decoder.name(), page = request.page, "delegating to external decoder");
        let mut clamped = |fraction: f32| {
            let fraction = if fraction.is_nan() { 0.0 } else { fraction };
            progress(fraction.clamp(0.0, 1.0));
        };

        decoder
            .decode(bytes, request, &mut clamped)
            .map_err(|e| {
                warn!(%format, tool = decoder.name(), error = %e, "external decoder failed");
                PipelineError::external(decoder.name(), e.message)
            })
    }

    /// Decode any supported input into a [`SourceImage`].
    ///
    /// Built-in formats are decoded in-process; everything else goes through
    /// the registered decoder, which must produce a bitmap.
    pub fn decode(
        &self,
        bytes: &[u8],
        hint: Option<&str>,
        request: &DecodeRequest,
        config: &PipelineConfig,
        progress: &mut dyn FnMut(f32),
    ) -> Result<SourceImage, PipelineError> {
        let format = InputFormat::detect(bytes, hint);
        if format.is_builtin() || bytes.is_empty() {
            return Ok(decode_image(bytes, hint, config)?);
        }

        match self.run(format, bytes, request, progress)? {
            ExternalOutput::Bitmap(bitmap) => {
                super::decoder::check_limits(format, bitmap.width(), bitmap.height(), config)?;
                Ok(SourceImage::new(bitmap, format))
            }
            other => {
                let tool = self.get(format).map(|d| d.name()).unwrap_or("external decoder");
                Err(PipelineError::external(
                    tool,
                    format!("returned {} output where a bitmap was expected", other.kind()),
                ))
            }
        }
    }
}
