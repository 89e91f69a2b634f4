//! EXIF metadata extraction for the metadata viewer.

use std::io::Cursor;

use exif::{Exif, Field, In, Reader, Tag, Value};
use image::ImageReader;

use super::{DecodeError, ExifField, ImageMetadata, InputFormat, Orientation};

/// Read dimensions and EXIF metadata without decoding pixel data.
///
/// Files without EXIF produce metadata with empty EXIF fields rather than an
/// error. Dimensions are 0 when they can't be determined (external formats
/// without EXIF dimension tags).
///
/// # Errors
///
/// `DecodeError::Empty` for an empty buffer and `DecodeError::Corrupted` when
/// a built-in format's header can't be parsed.
pub fn read_metadata(bytes: &[u8], hint: Option<&str>) -> Result<ImageMetadata, DecodeError> {
    let format = InputFormat::detect(bytes, hint);
    if bytes.is_empty() {
        return Err(DecodeError::Empty { format });
    }

    let mut metadata = ImageMetadata {
        format,
        ..Default::default()
    };

    if let Some(image_format) = format.image_format() {
        let (width, height) = ImageReader::with_format(Cursor::new(bytes), image_format)
            .into_dimensions()
            .map_err(|e| DecodeError::Corrupted {
                format,
                message: e.to_string(),
            })?;
        metadata.width = width;
        metadata.height = height;
    }

    let mut cursor = Cursor::new(bytes);
    if let Ok(exif) = Reader::new().read_from_container(&mut cursor) {
        fill_from_exif(&mut metadata, &exif);
    }

    Ok(metadata)
}

fn fill_from_exif(metadata: &mut ImageMetadata, exif: &Exif) {
    let primary = |tag: Tag| exif.get_field(tag, In::PRIMARY);

    metadata.orientation = primary(Tag::Orientation)
        .and_then(|f| f.value.get_uint(0))
        .map(Orientation::from)
        .unwrap_or_default();
    metadata.camera_make = primary(Tag::Make).and_then(ascii);
    metadata.camera_model = primary(Tag::Model).and_then(ascii);
    metadata.date_taken = primary(Tag::DateTimeOriginal)
        .or_else(|| primary(Tag::DateTime))
        .and_then(ascii);
    metadata.iso = primary(Tag::PhotographicSensitivity).and_then(|f| f.value.get_uint(0));
    metadata.shutter_speed = primary(Tag::ExposureTime).map(|f| f.display_value().to_string());
    metadata.aperture = primary(Tag::FNumber).and_then(rational);
    metadata.focal_length = primary(Tag::FocalLength).and_then(rational);

    if metadata.width == 0 || metadata.height == 0 {
        let dim = |tag: Tag| primary(tag).and_then(|f| f.value.get_uint(0));
        if let (Some(w), Some(h)) = (dim(Tag::PixelXDimension), dim(Tag::PixelYDimension)) {
            metadata.width = w;
            metadata.height = h;
        }
    }

    metadata.fields = exif
        .fields()
        .map(|field| ExifField {
            tag: field.tag.to_string(),
            ifd: ifd_name(field.ifd_num),
            value: field.display_value().with_unit(exif).to_string(),
        })
        .collect();
}

fn ifd_name(ifd: In) -> String {
    if ifd == In::PRIMARY {
        "primary".to_string()
    } else if ifd == In::THUMBNAIL {
        "thumbnail".to_string()
    } else {
        format!("ifd{}", ifd.0)
    }
}

/// First ASCII string of a field, without the trailing NULs some cameras write.
fn ascii(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(values) => values.first().and_then(|raw| {
            let text = String::from_utf8_lossy(raw);
            let text = text.trim_end_matches('\0').trim();
            (!text.is_empty()).then(|| text.to_string())
        }),
        _ => None,
    }
}

fn rational(field: &Field) -> Option<f32> {
    match &field.value {
        Value::Rational(values) => values
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| r.to_f64() as f32),
        _ => None,
    }
}
