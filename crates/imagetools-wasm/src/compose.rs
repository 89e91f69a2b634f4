//! Text and overlay WASM bindings.
//!
//! Fonts are fetched by the page and handed over as bytes:
//!
//! ```typescript
//! const font = new JsFont(new Uint8Array(await (await fetch('/fonts/Impact.ttf')).arrayBuffer()));
//! const meme = meme_text(image, font, 'top text', 'bottom text');
//! ```

use imagetools_core::compose::{self, Font, TextOverlay};
use imagetools_core::transform::scaled_dimensions;
use imagetools_core::PipelineConfig;
use wasm_bindgen::prelude::*;

use crate::to_js_error;
use crate::types::{parse_color, JsBitmap};

/// A parsed TrueType/OpenType font.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsFont {
    inner: Font,
}

#[wasm_bindgen]
impl JsFont {
    /// Parse font file bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes aren't a TrueType/OpenType font.
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: Vec<u8>) -> Result<JsFont, JsValue> {
        Font::from_bytes(bytes)
            .map(|inner| JsFont { inner })
            .map_err(to_js_error)
    }

    /// Width of `text` in pixels at `size`.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        compose::measure_text(&self.inner, text, size)
    }
}

impl JsFont {
    pub(crate) fn font(&self) -> &Font {
        &self.inner
    }
}

/// Draw `text` centered on `(x_percent, y_percent)` of the image.
///
/// # Arguments
///
/// * `size` - Font size in pixels
/// * `color` - Fill color as `#RGB` or `#RRGGBB`
#[wasm_bindgen]
pub fn draw_text(
    image: &JsBitmap,
    font: &JsFont,
    text: &str,
    x_percent: f64,
    y_percent: f64,
    size: f32,
    color: &str,
) -> Result<JsBitmap, JsValue> {
    let overlay = TextOverlay {
        text: text.to_string(),
        x_percent,
        y_percent,
        size,
        color: parse_color(color)?,
    };
    compose::draw_text(image.as_bitmap(), font.font(), &overlay)
        .map(JsBitmap::from_bitmap)
        .map_err(to_js_error)
}

/// Classic meme captions: uppercase white text with a black outline, sized
/// to a tenth of the image width. Either line may be empty.
#[wasm_bindgen]
pub fn meme_text(image: &JsBitmap, font: &JsFont, top: &str, bottom: &str) -> JsBitmap {
    JsBitmap::from_bitmap(compose::meme_text(image.as_bitmap(), font.font(), top, bottom))
}

/// Place `overlay`, scaled by `scale`, on `base`.
///
/// Positions are percentages of the space left over after placing the
/// overlay: 0 is flush left/top, 100 is flush right/bottom.
#[wasm_bindgen]
pub fn composite_image(
    base: &JsBitmap,
    overlay: &JsBitmap,
    x_percent: f64,
    y_percent: f64,
    scale: f64,
) -> Result<JsBitmap, JsValue> {
    composite_with(
        base,
        overlay,
        (x_percent, y_percent),
        scale,
        &PipelineConfig::default(),
    )
}

/// Composite under `config`: its size limits bound the scaled overlay and
/// its filter resamples it.
pub(crate) fn composite_with(
    base: &JsBitmap,
    overlay: &JsBitmap,
    (x_percent, y_percent): (f64, f64),
    scale: f64,
    config: &PipelineConfig,
) -> Result<JsBitmap, JsValue> {
    let (width, height) = scaled_dimensions(overlay.width(), overlay.height(), scale);
    config
        .check_output_size("scale", width.into(), height.into())
        .map_err(to_js_error)?;
    compose::composite(
        base.as_bitmap(),
        overlay.as_bitmap(),
        x_percent,
        y_percent,
        scale,
        config.resample_filter,
    )
    .map(JsBitmap::from_bitmap)
    .map_err(to_js_error)
}
