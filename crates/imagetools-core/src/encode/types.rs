//! Output formats, output settings and encoded results.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::PipelineError;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// This build has no encoder for the format.
    #[error("No {0} encoder is available in this build")]
    UnsupportedFormat(OutputFormat),

    /// The underlying encoder failed.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Avif => "image/avif",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Avif => "avif",
        }
    }

    /// True when the encoder ignores the quality setting.
    pub fn is_lossless(self) -> bool {
        matches!(self, OutputFormat::Png | OutputFormat::WebP)
    }

    /// True when transparency survives encoding.
    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }

    /// True when this build can produce the format.
    pub fn is_available(self) -> bool {
        match self {
            OutputFormat::Avif => cfg!(feature = "avif"),
            _ => true,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::WebP => "WebP",
            OutputFormat::Avif => "AVIF",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = PipelineError;

    /// Accepts a format name, an extension or a MIME type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("image/").unwrap_or(&lower);
        match name {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "avif" => Ok(OutputFormat::Avif),
            _ => Err(PipelineError::invalid(
                "format",
                format!("unknown output format {s:?}"),
            )),
        }
    }
}

/// Quality used when none is given.
pub const DEFAULT_QUALITY: f32 = 0.9;

/// Target format and quality for export.
///
/// Quality is in `[0, 1]` like `canvas.toBlob`; lossless formats ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOutputSpec")]
pub struct OutputSpec {
    format: OutputFormat,
    quality: f32,
}

#[derive(Deserialize)]
struct RawOutputSpec {
    format: OutputFormat,
    #[serde(default = "default_quality")]
    quality: f32,
}

fn default_quality() -> f32 {
    DEFAULT_QUALITY
}

impl TryFrom<RawOutputSpec> for OutputSpec {
    type Error = PipelineError;

    fn try_from(raw: RawOutputSpec) -> Result<Self, Self::Error> {
        OutputSpec::new(raw.format, raw.quality)
    }
}

impl OutputSpec {
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidParameter` if `quality` is outside
    /// `[0, 1]`.
    pub fn new(format: OutputFormat, quality: f32) -> Result<Self, PipelineError> {
        if !(0.0..=1.0).contains(&quality) {
            return Err(PipelineError::invalid(
                "quality",
                format!("must be between 0 and 1, got {quality}"),
            ));
        }
        Ok(Self { format, quality })
    }

    /// JPEG at `quality`, clamped into `[0, 1]` (NaN becomes the default).
    pub fn jpeg(quality: f32) -> Self {
        let quality = if quality.is_nan() {
            DEFAULT_QUALITY
        } else {
            quality.clamp(0.0, 1.0)
        };
        Self {
            format: OutputFormat::Jpeg,
            quality,
        }
    }

    /// Lossless PNG.
    pub fn png() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 1.0,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Quality on the 1-100 scale used by the encoders.
    pub fn quality_percent(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self::jpeg(DEFAULT_QUALITY)
    }
}

/// Encoded output ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    format: OutputFormat,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, format: OutputFormat) -> Self {
        Self { bytes, format }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Render as a `data:` URI.
    pub fn to_data_url(&self) -> String {
        data_url(&self.bytes, self.mime_type())
    }
}

/// Base64 `data:` URI for arbitrary bytes.
pub fn data_url(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Human readable byte size ("512 B", "12.3 KB", "4.56 MB").
pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.2} MB", b / (KB * KB))
    }
}

/// Suggested download name: `<stem>-<suffix>.<ext>`.
///
/// The stem is the original file name without directories or extension;
/// an empty stem becomes "image". An empty suffix is left out.
pub fn export_filename(original: &str, suffix: &str, format: OutputFormat) -> String {
    let name = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    };
    let stem = if stem.trim().is_empty() { "image" } else { stem };

    if suffix.is_empty() {
        format!("{stem}.{}", format.extension())
    } else {
        format!("{stem}-{suffix}.{}", format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metadata() {
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert!(OutputFormat::WebP.is_lossless());
        assert!(!OutputFormat::Jpeg.supports_alpha());
        assert_eq!(OutputFormat::Avif.to_string(), "AVIF");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("image/jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("JPG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("webp".parse::<OutputFormat>().unwrap(), OutputFormat::WebP);
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_spec_quality() {
        assert!(OutputSpec::new(OutputFormat::Jpeg, 1.5).is_err());
        assert!(OutputSpec::new(OutputFormat::Jpeg, -0.1).is_err());
        assert!(OutputSpec::new(OutputFormat::Jpeg, f32::NAN).is_err());

        let spec = OutputSpec::new(OutputFormat::Jpeg, 0.0).unwrap();
        assert_eq!(spec.quality_percent(), 1);
        let spec = OutputSpec::new(OutputFormat::Jpeg, 0.92).unwrap();
        assert_eq!(spec.quality_percent(), 92);

        assert_eq!(OutputSpec::jpeg(7.0).quality(), 1.0);
        assert_eq!(OutputSpec::jpeg(f32::NAN).quality(), DEFAULT_QUALITY);
        assert_eq!(OutputSpec::default().format(), OutputFormat::Jpeg);
    }

    #[test]
    fn test_output_spec_deserialize() {
        let spec: OutputSpec = serde_json::from_str(r#"{"format": "webp"}"#).unwrap();
        assert_eq!(spec.format(), OutputFormat::WebP);
        assert!((spec.quality() - DEFAULT_QUALITY).abs() < f32::EPSILON);

        let bad = serde_json::from_str::<OutputSpec>(r#"{"format": "jpeg", "quality": 3}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_data_url() {
        let encoded = EncodedImage::new(vec![0x89, b'P', b'N', b'G'], OutputFormat::Png);
        assert_eq!(encoded.to_data_url(), "data:image/png;base64,iVBORw==");
        assert_eq!(encoded.len(), 4);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(
            export_filename("holiday.photo.png", "resized", OutputFormat::Jpeg),
            "holiday.photo-resized.jpg"
        );
        assert_eq!(
            export_filename("C:\\pics\\cat.heic", "converted", OutputFormat::Png),
            "cat-converted.png"
        );
        assert_eq!(export_filename("", "blurred", OutputFormat::WebP), "image-blurred.webp");
        assert_eq!(export_filename(".hidden", "", OutputFormat::Png), ".hidden.png");
    }
}
