//! Text rendering for the add-text and meme tools.
//!
//! Glyphs are rasterized with `ab_glyph` into a coverage mask the size of
//! the target bitmap, then painted with source-over blending. Fonts are
//! supplied by the caller (the browser fetches them), so nothing is
//! embedded in the binary.

use std::fmt;

use ab_glyph::{point, Font as _, FontArc, GlyphId, PxScale, ScaleFont};
use serde::{Deserialize, Serialize};

use super::blend_pixel;
use crate::bitmap::Bitmap;
use crate::color::Rgb;
use crate::error::{PipelineError, Result};

/// A parsed TrueType/OpenType font, cheap to clone.
#[derive(Clone)]
pub struct Font {
    inner: FontArc,
}

impl Font {
    /// Parse font file bytes.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidParameter` if the bytes aren't a font.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let inner = FontArc::try_from_vec(bytes)
            .map_err(|e| PipelineError::invalid("font", e.to_string()))?;
        Ok(Self { inner })
    }
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("glyphs", &self.inner.glyph_count())
            .finish()
    }
}

/// Free text placed on the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,
    /// Horizontal anchor as a percentage of the image width.
    pub x_percent: f64,
    /// Vertical anchor as a percentage of the image height.
    pub y_percent: f64,
    /// Font size in pixels.
    pub size: f32,
    pub color: Rgb,
}

/// Which part of the line box sits on the anchor's y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Baseline {
    Top,
    Middle,
    Bottom,
}

/// Width of `text` in pixels at `size`, including kerning.
pub fn measure_text(font: &Font, text: &str, size: f32) -> f32 {
    let scaled = font.inner.as_scaled(PxScale::from(size));
    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev_glyph {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    width
}

/// Coverage mask (0.0 to 1.0 per pixel) matching a bitmap's dimensions.
struct Coverage {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl Coverage {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width as usize * height as usize],
        }
    }

    fn is_empty(&self) -> bool {
        self.values.iter().all(|&v| v <= 0.0)
    }

    /// Bounding box of non-zero coverage as `(min_x, min_y, max_x, max_y)`.
    fn bounds(&self) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.values[(y * self.width + x) as usize] > 0.0 {
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }
        bounds
    }

    /// Grow the mask by `radius` pixels (a round stroke around each glyph).
    fn dilate(&self, radius: f32) -> Coverage {
        let reach = radius.ceil() as i64;
        let Some((x0, y0, x1, y1)) = self.bounds() else {
            return Coverage::new(self.width, self.height);
        };
        if reach == 0 {
            return Coverage {
                width: self.width,
                height: self.height,
                values: self.values.clone(),
            };
        }

        let offsets: Vec<(i64, i64)> = (-reach..=reach)
            .flat_map(|dy| (-reach..=reach).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| ((dx * dx + dy * dy) as f32).sqrt() <= radius)
            .collect();

        let (w, h) = (self.width as i64, self.height as i64);
        let mut out = Coverage::new(self.width, self.height);
        let y_range = (y0 as i64 - reach).max(0)..=(y1 as i64 + reach).min(h - 1);
        let x_range = (x0 as i64 - reach).max(0)..=(x1 as i64 + reach).min(w - 1);

        for y in y_range {
            for x in x_range.clone() {
                let mut best = 0.0f32;
                for &(dx, dy) in &offsets {
                    let (sx, sy) = (x + dx, y + dy);
                    if sx >= 0 && sy >= 0 && sx < w && sy < h {
                        best = best.max(self.values[(sy * w + sx) as usize]);
                    }
                }
                out.values[(y * w + x) as usize] = best;
            }
        }
        out
    }

    /// Paint `color` onto `bitmap` weighted by coverage.
    fn paint(&self, bitmap: &mut Bitmap, color: Rgb) {
        let [r, g, b, _] = color.to_rgba();
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.values[(y * self.width + x) as usize];
                if c <= 0.0 {
                    continue;
                }
                let alpha = (c.min(1.0) * 255.0).round() as u8;
                let bottom = bitmap.pixel(x, y);
                bitmap.put_pixel(x, y, blend_pixel(bottom, [r, g, b, alpha]));
            }
        }
    }
}

/// Rasterize one horizontally centered line of text.
fn rasterize(
    font: &Font,
    text: &str,
    size: f32,
    anchor: (f32, f32),
    baseline: Baseline,
    canvas: (u32, u32),
) -> Coverage {
    let mut coverage = Coverage::new(canvas.0, canvas.1);
    let scale = PxScale::from(size);
    let scaled = font.inner.as_scaled(scale);

    // descent is negative in ab_glyph
    let baseline_y = match baseline {
        Baseline::Top => anchor.1 + scaled.ascent(),
        Baseline::Middle => anchor.1 + (scaled.ascent() + scaled.descent()) / 2.0,
        Baseline::Bottom => anchor.1 + scaled.descent(),
    };

    let mut cursor_x = anchor.0 - measure_text(font, text, size) / 2.0;
    let mut prev_glyph: Option<GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, baseline_y));
        if let Some(outlined) = font.inner.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, c| {
                let x = px as i64 + bounds.min.x as i64;
                let y = py as i64 + bounds.min.y as i64;
                if x >= 0 && y >= 0 && x < canvas.0 as i64 && y < canvas.1 as i64 {
                    let idx = (y as u32 * canvas.0 + x as u32) as usize;
                    coverage.values[idx] = coverage.values[idx].max(c);
                }
            });
        }

        cursor_x += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    coverage
}

/// Glyphs larger than this multiple of the longer image side can't be
/// seen and only cost rasterization time.
const MAX_SIZE_PER_SIDE: f32 = 4.0;

/// Check a font size against the canvas it is drawn on.
fn check_size(size: f32, canvas: (u32, u32)) -> Result<()> {
    if !(size.is_finite() && size > 0.0) {
        return Err(PipelineError::invalid("size", "font size must be positive"));
    }
    let max_size = MAX_SIZE_PER_SIDE * canvas.0.max(canvas.1) as f32;
    if size > max_size {
        return Err(PipelineError::invalid(
            "size",
            format!(
                "font size {size}px exceeds {max_size}px for a {}x{} image",
                canvas.0, canvas.1
            ),
        ));
    }
    Ok(())
}

/// Draw free text centered on `(x%, y%)` of the bitmap.
///
/// # Errors
///
/// Returns `PipelineError::InvalidParameter` for a non-positive size, a size
/// over four times the longer image side, or a non-finite position.
pub fn draw_text(bitmap: &Bitmap, font: &Font, overlay: &TextOverlay) -> Result<Bitmap> {
    check_size(overlay.size, bitmap.dimensions())?;
    if !(overlay.x_percent.is_finite() && overlay.y_percent.is_finite()) {
        return Err(PipelineError::invalid("position", "text position must be finite"));
    }
    if overlay.text.is_empty() {
        return Ok(bitmap.clone());
    }

    let (w, h) = bitmap.dimensions();
    let anchor = (
        (overlay.x_percent / 100.0 * w as f64) as f32,
        (overlay.y_percent / 100.0 * h as f64) as f32,
    );
    let coverage = rasterize(font, &overlay.text, overlay.size, anchor, Baseline::Middle, (w, h));

    let mut output = bitmap.clone();
    coverage.paint(&mut output, overlay.color);
    Ok(output)
}

/// Classic meme captions: uppercase white text with a black outline.
///
/// Font size is `floor(width / 10)`. The top line's top edge sits at
/// `size / 2`; the bottom line's bottom edge sits at `height - size / 2`.
/// The outline is a stroke of width `size / 15` centered on the glyph
/// edges.
pub fn meme_text(bitmap: &Bitmap, font: &Font, top: &str, bottom: &str) -> Bitmap {
    let (w, h) = bitmap.dimensions();
    let size = ((w / 10).max(1)) as f32;
    let stroke = size / 15.0;
    let center_x = w as f32 / 2.0;

    let mut output = bitmap.clone();
    let lines = [
        (top.trim(), size / 2.0, Baseline::Top),
        (bottom.trim(), h as f32 - size / 2.0, Baseline::Bottom),
    ];

    for (text, y, baseline) in lines {
        if text.is_empty() {
            continue;
        }
        let upper = text.to_uppercase();
        let fill = rasterize(font, &upper, size, (center_x, y), baseline, (w, h));
        if fill.is_empty() {
            continue;
        }
        fill.dilate(stroke / 2.0).paint(&mut output, Rgb::BLACK);
        fill.paint(&mut output, Rgb::WHITE);
    }

    output
}
