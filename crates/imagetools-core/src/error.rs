//! Pipeline-level error taxonomy.
//!
//! Module errors (`DecodeError`, `EncodeError`) stay specific to their stage
//! and roll up into [`PipelineError`] at the pipeline boundary.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::{EncodeError, OutputFormat};

/// Errors surfaced by a pipeline invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input bytes could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A transform or output parameter is out of range.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A region extends past the source bitmap.
    #[error(
        "Region {width}x{height} at ({x}, {y}) exceeds the {bounds_width}x{bounds_height} image"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        bounds_width: u32,
        bounds_height: u32,
    },

    /// The requested output format can't be produced by this build.
    #[error("{0} output is not supported in this environment")]
    UnsupportedFormat(OutputFormat),

    /// A delegated decoder or tool (HEIC, PDF, OCR, ...) rejected its input.
    #[error("{tool} failed: {message}")]
    ExternalToolFailure { tool: String, message: String },

    /// The encoder failed for a reason other than format availability.
    #[error(transparent)]
    Encode(EncodeError),
}

impl PipelineError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PipelineError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn external(tool: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::ExternalToolFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by user input that can be fixed by resubmitting.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Decode(_)
                | PipelineError::InvalidParameter { .. }
                | PipelineError::OutOfBounds { .. }
        )
    }
}

impl From<EncodeError> for PipelineError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::UnsupportedFormat(format) => PipelineError::UnsupportedFormat(format),
            other => PipelineError::Encode(other),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
