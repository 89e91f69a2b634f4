//! Input formats, decode errors and the decoded source image.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bitmap::Bitmap;

/// Why an upload could not be decoded.
///
/// Every variant names the format that was attempted.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No bytes were supplied.
    #[error("No image data supplied (expected {format})")]
    Empty { format: InputFormat },

    /// The format is not recognized, or needs a decoder that isn't available.
    #[error("Unsupported image format: {format}")]
    Unsupported { format: InputFormat },

    /// The bytes are truncated or corrupted.
    #[error("Corrupted or incomplete {format} image: {message}")]
    Corrupted { format: InputFormat, message: String },

    /// The image exceeds the configured decode limits.
    #[error("{format} image of {width}x{height} exceeds the decode limit of {max_pixels} pixels")]
    TooLarge {
        format: InputFormat,
        width: u32,
        height: u32,
        max_pixels: u64,
    },
}

impl DecodeError {
    /// The format the decoder was attempting.
    pub fn format(&self) -> InputFormat {
        match self {
            DecodeError::Empty { format }
            | DecodeError::Unsupported { format }
            | DecodeError::Corrupted { format, .. }
            | DecodeError::TooLarge { format, .. } => *format,
        }
    }
}

/// Input container formats the tools accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Avif,
    Heic,
    Psd,
    Tiff,
    Pdf,
    #[default]
    Unknown,
}

impl InputFormat {
    /// Detect the format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> InputFormat {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            InputFormat::Jpeg
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            InputFormat::Png
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            InputFormat::Gif
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            InputFormat::WebP
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            InputFormat::Tiff
        } else if bytes.starts_with(b"8BPS") {
            InputFormat::Psd
        } else if bytes.starts_with(b"%PDF") {
            InputFormat::Pdf
        } else if bytes.starts_with(b"BM") {
            InputFormat::Bmp
        } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
            match &bytes[8..12] {
                b"avif" | b"avis" => InputFormat::Avif,
                b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"mif1"
                | b"msf1" => InputFormat::Heic,
                _ => InputFormat::Unknown,
            }
        } else {
            InputFormat::Unknown
        }
    }

    /// Interpret a declared content type: a MIME type, a file name, or a bare extension.
    pub fn from_hint(hint: &str) -> InputFormat {
        let hint = hint.trim().to_ascii_lowercase();
        let key = if let Some(subtype) = hint.strip_prefix("image/") {
            subtype.to_string()
        } else if hint == "application/pdf" {
            "pdf".to_string()
        } else {
            hint.rsplit('.').next().unwrap_or_default().to_string()
        };

        match key.as_str() {
            "jpeg" | "jpg" | "pjpeg" => InputFormat::Jpeg,
            "png" => InputFormat::Png,
            "webp" => InputFormat::WebP,
            "gif" => InputFormat::Gif,
            "bmp" => InputFormat::Bmp,
            "avif" => InputFormat::Avif,
            "heic" | "heif" => InputFormat::Heic,
            "vnd.adobe.photoshop" | "psd" => InputFormat::Psd,
            "tiff" | "tif" => InputFormat::Tiff,
            "pdf" => InputFormat::Pdf,
            _ => InputFormat::Unknown,
        }
    }

    /// Sniff the bytes, falling back to the hint when the magic is unknown.
    pub fn detect(bytes: &[u8], hint: Option<&str>) -> InputFormat {
        match InputFormat::sniff(bytes) {
            InputFormat::Unknown => hint.map(InputFormat::from_hint).unwrap_or_default(),
            format => format,
        }
    }

    /// Formats decoded in-process by the `image` crate.
    pub fn is_builtin(self) -> bool {
        self.image_format().is_some()
    }

    /// Container formats that must go through an external decoder.
    pub fn requires_external(self) -> bool {
        matches!(
            self,
            InputFormat::Heic | InputFormat::Psd | InputFormat::Tiff | InputFormat::Pdf
        )
    }

    pub(crate) fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            InputFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            InputFormat::Png => Some(image::ImageFormat::Png),
            InputFormat::WebP => Some(image::ImageFormat::WebP),
            InputFormat::Gif => Some(image::ImageFormat::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputFormat::Jpeg => "JPEG",
            InputFormat::Png => "PNG",
            InputFormat::WebP => "WebP",
            InputFormat::Gif => "GIF",
            InputFormat::Bmp => "BMP",
            InputFormat::Avif => "AVIF",
            InputFormat::Heic => "HEIC",
            InputFormat::Psd => "PSD",
            InputFormat::Tiff => "TIFF",
            InputFormat::Pdf => "PDF",
            InputFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// EXIF `Orientation` tag (values 1-8); unknown values read as `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Already upright.
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Mirrored across the main diagonal.
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Mirrored across the anti-diagonal.
    Transverse = 7,
    /// Rotate 90 degrees counter-clockwise.
    Rotate270CW = 8,
}

impl Orientation {
    /// Whether correcting this orientation turns a landscape bitmap portrait.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// One EXIF field rendered for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExifField {
    /// Tag name (e.g., "Model").
    pub tag: String,
    /// IFD the tag came from ("primary" or "thumbnail").
    pub ifd: String,
    /// Human readable value, with units where EXIF defines them.
    pub value: String,
}

/// What the metadata viewer shows for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Detected container format.
    pub format: InputFormat,
    /// Image width in pixels (before orientation correction), 0 if unknown.
    pub width: u32,
    /// Image height in pixels (before orientation correction), 0 if unknown.
    pub height: u32,
    /// EXIF orientation.
    pub orientation: Orientation,
    /// `Make` tag.
    pub camera_make: Option<String>,
    /// `Model` tag.
    pub camera_model: Option<String>,
    /// Date/time the photo was taken, as recorded.
    pub date_taken: Option<String>,
    /// ISO sensitivity.
    pub iso: Option<u32>,
    /// Exposure time, e.g. "1/250".
    pub shutter_speed: Option<String>,
    /// F-number.
    pub aperture: Option<f32>,
    /// Focal length in mm.
    pub focal_length: Option<f32>,
    /// Every EXIF field found, in file order.
    pub fields: Vec<ExifField>,
}

impl ImageMetadata {
    /// Width and height as displayed, after orientation correction.
    pub fn oriented_dimensions(&self) -> (u32, u32) {
        if self.orientation.swaps_dimensions() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// True when the file carried any EXIF data.
    pub fn has_exif(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// An immutable decoded input image.
///
/// Cloning is cheap: the bitmap is shared, never copied. Transform stages
/// borrow it and produce new bitmaps, so the original stays available for
/// side-by-side previews.
#[derive(Debug, Clone)]
pub struct SourceImage {
    bitmap: Arc<Bitmap>,
    format: InputFormat,
}

impl SourceImage {
    pub fn new(bitmap: Bitmap, format: InputFormat) -> Self {
        Self {
            bitmap: Arc::new(bitmap),
            format,
        }
    }

    /// The format the bytes were decoded from.
    pub fn format(&self) -> InputFormat {
        self.format
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// True if both handles point at the same decoded bitmap.
    pub fn shares_bitmap_with(&self, other: &SourceImage) -> bool {
        Arc::ptr_eq(&self.bitmap, &other.bitmap)
    }
}

impl Deref for SourceImage {
    type Target = Bitmap;

    fn deref(&self) -> &Self::Target {
        &self.bitmap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_magic_bytes() {
        assert_eq!(InputFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), InputFormat::Jpeg);
        assert_eq!(InputFormat::sniff(b"\x89PNG\r\n\x1a\n...."), InputFormat::Png);
        assert_eq!(InputFormat::sniff(b"GIF89a"), InputFormat::Gif);
        assert_eq!(InputFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "), InputFormat::WebP);
        assert_eq!(InputFormat::sniff(b"II*\0\x08\0\0\0"), InputFormat::Tiff);
        assert_eq!(InputFormat::sniff(b"MM\0*\0\0\0\x08"), InputFormat::Tiff);
        assert_eq!(InputFormat::sniff(b"8BPS\0\x01"), InputFormat::Psd);
        assert_eq!(InputFormat::sniff(b"%PDF-1.7"), InputFormat::Pdf);
        assert_eq!(InputFormat::sniff(b"\0\0\0\x18ftypheic"), InputFormat::Heic);
        assert_eq!(InputFormat::sniff(b"\0\0\0\x1cftypavif"), InputFormat::Avif);
        assert_eq!(InputFormat::sniff(b"hello"), InputFormat::Unknown);
        assert_eq!(InputFormat::sniff(&[]), InputFormat::Unknown);
    }

    #[test]
    fn test_from_hint() {
        assert_eq!(InputFormat::from_hint("image/jpeg"), InputFormat::Jpeg);
        assert_eq!(InputFormat::from_hint("IMAGE/PNG"), InputFormat::Png);
        assert_eq!(InputFormat::from_hint("application/pdf"), InputFormat::Pdf);
        assert_eq!(InputFormat::from_hint("holiday.HEIC"), InputFormat::Heic);
        assert_eq!(InputFormat::from_hint("scan.tif"), InputFormat::Tiff);
        assert_eq!(InputFormat::from_hint("psd"), InputFormat::Psd);
        assert_eq!(InputFormat::from_hint("text/plain"), InputFormat::Unknown);
    }

    #[test]
    fn test_detect_prefers_magic_over_hint() {
        let png = b"\x89PNG\r\n\x1a\n";
        assert_eq!(InputFormat::detect(png, Some("image/jpeg")), InputFormat::Png);
        assert_eq!(InputFormat::detect(b"????", Some("image/heic")), InputFormat::Heic);
        assert_eq!(InputFormat::detect(b"????", None), InputFormat::Unknown);
    }

    #[test]
    fn test_builtin_and_external_split() {
        assert!(InputFormat::Jpeg.is_builtin());
        assert!(InputFormat::Gif.is_builtin());
        assert!(!InputFormat::Heic.is_builtin());
        assert!(InputFormat::Heic.requires_external());
        assert!(InputFormat::Pdf.requires_external());
        assert!(!InputFormat::Png.requires_external());
    }

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(99), Orientation::Normal);
    }

    #[test]
    fn test_oriented_dimensions() {
        let mut meta = ImageMetadata {
            width: 6000,
            height: 4000,
            ..Default::default()
        };
        assert_eq!(meta.oriented_dimensions(), (6000, 4000));

        meta.orientation = Orientation::Rotate90CW;
        assert_eq!(meta.oriented_dimensions(), (4000, 6000));
    }

    #[test]
    fn test_decode_error_names_format() {
        let err = DecodeError::Corrupted {
            format: InputFormat::Jpeg,
            message: "unexpected EOF".to_string(),
        };
        assert_eq!(err.format(), InputFormat::Jpeg);
        assert_eq!(
            err.to_string(),
            "Corrupted or incomplete JPEG image: unexpected EOF"
        );

        let err = DecodeError::Unsupported {
            format: InputFormat::Heic,
        };
        assert_eq!(err.to_string(), "Unsupported image format: HEIC");
    }

    #[test]
    fn test_source_image_clone_shares_bitmap() {
        let source = SourceImage::new(Bitmap::filled(4, 4, [1, 2, 3, 255]), InputFormat::Png);
        let copy = source.clone();
        assert!(source.shares_bitmap_with(&copy));
        assert_eq!(copy.width(), 4);
        assert_eq!(copy.format(), InputFormat::Png);
    }
}
