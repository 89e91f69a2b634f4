//! Tool session WASM bindings.
//!
//! A page creates one `JsToolSession`, loads the user's file, and re-renders
//! whenever a control changes. Renders started before the latest one are
//! refused at commit time.
//!
//! # Example (TypeScript)
//!
//! ```typescript
//! const session = new JsToolSession({ collage_width: 900 });
//! session.load(bytes, file.type, (p: number) => progress.value = p);
//!
//! slider.oninput = () => {
//!   session.set_spec([{ op: 'blur', amount: Number(slider.value) }]);
//!   const invocation = session.begin();
//!   const rendered = invocation.run();
//!   if (session.commit(invocation, rendered)) draw(rendered);
//! };
//! ```

use imagetools_core::encode::OutputFormat;
use imagetools_core::{
    Invocation, OutputSpec, PipelineConfig, ToolSession, TransformSpec,
};
use wasm_bindgen::prelude::*;

use crate::compose::JsFont;
use crate::encode::JsEncodedImage;
use crate::to_js_error;
use crate::types::{JsBitmap, JsBitmapList};

/// One render attempt, detached from the session.
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsInvocation {
    inner: Invocation,
}

#[wasm_bindgen]
impl JsInvocation {
    /// Monotonically increasing id of this attempt.
    #[wasm_bindgen(getter)]
    pub fn token(&self) -> f64 {
        self.inner.token().value() as f64
    }

    /// Run the transform stages.
    ///
    /// # Errors
    ///
    /// Returns the first stage error, e.g. a crop outside the image.
    pub fn run(&self) -> Result<JsBitmap, JsValue> {
        self.inner
            .run()
            .map(JsBitmap::from_bitmap)
            .map_err(to_js_error)
    }
}

/// Per-tool session: source image, layers, font, spec and latest render.
#[wasm_bindgen]
#[derive(Debug)]
pub struct JsToolSession {
    inner: ToolSession,
}

#[wasm_bindgen]
impl JsToolSession {
    /// Create a session. `config` is an optional partial `PipelineConfig`
    /// object; missing fields use the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsToolSession, JsValue> {
        let config: PipelineConfig = if config.is_undefined() || config.is_null() {
            PipelineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| to_js_error(format!("Invalid config: {e}")))?
        };
        Ok(JsToolSession::from_config(config))
    }

    /// Decode `bytes` and make it the source image.
    ///
    /// `progress` is called with a fraction in `[0, 1]` by external decoders.
    /// On failure the previous image and render are kept.
    pub fn load(
        &mut self,
        bytes: &[u8],
        hint: Option<String>,
        progress: Option<js_sys::Function>,
    ) -> Result<(), JsValue> {
        let mut report = |fraction: f32| {
            if let Some(callback) = &progress {
                report_progress(callback, fraction);
            }
        };
        self.inner
            .load(bytes, hint.as_deref(), &mut report)
            .map(|_| ())
            .map_err(to_js_error)
    }

    /// Use a bitmap read from a canvas as the source image.
    pub fn load_bitmap(&mut self, image: &JsBitmap) {
        self.inner.load_bitmap(image.as_bitmap().clone());
    }

    #[wasm_bindgen(getter)]
    pub fn has_source(&self) -> bool {
        self.inner.source().is_some()
    }

    /// The loaded file's EXIF metadata, or `undefined`.
    pub fn metadata(&self) -> Result<JsValue, JsValue> {
        match self.inner.metadata() {
            Some(metadata) => serde_wasm_bindgen::to_value(metadata).map_err(to_js_error),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Add an overlay image; returns the index `composite` ops refer to.
    pub fn add_layer(&mut self, image: &JsBitmap) -> usize {
        self.inner.add_layer(image.as_bitmap().clone())
    }

    pub fn clear_layers(&mut self) {
        self.inner.clear_layers();
    }

    pub fn set_font(&mut self, font: &JsFont) {
        self.inner.set_font(font.font().clone());
    }

    /// Replace the transform spec with an array of ops, e.g.
    /// `[{ op: 'rotate', degrees: 90 }, { op: 'grayscale' }]`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown op or an out-of-range parameter; the
    /// previous spec is kept.
    pub fn set_spec(&mut self, spec: JsValue) -> Result<(), JsValue> {
        let spec: TransformSpec = serde_wasm_bindgen::from_value(spec)
            .map_err(|e| to_js_error(format!("Invalid transform spec: {e}")))?;
        self.inner.set_spec(spec);
        Ok(())
    }

    /// Same as `set_spec`, from a JSON string.
    pub fn set_spec_json(&mut self, json: &str) -> Result<(), JsValue> {
        let spec: TransformSpec = serde_json::from_str(json)
            .map_err(|e| to_js_error(format!("Invalid transform spec: {e}")))?;
        self.inner.set_spec(spec);
        Ok(())
    }

    /// Choose the export format ("jpeg", "png", "webp", "avif") and quality.
    pub fn set_output(&mut self, format: &str, quality: f32) -> Result<(), JsValue> {
        let format = format.parse::<OutputFormat>().map_err(to_js_error)?;
        let output = OutputSpec::new(format, quality).map_err(to_js_error)?;
        self.inner.set_output(output);
        Ok(())
    }

    /// Start a render attempt.
    ///
    /// # Errors
    ///
    /// Returns an error when no image is loaded.
    pub fn begin(&mut self) -> Result<JsInvocation, JsValue> {
        self.inner
            .begin()
            .map(|inner| JsInvocation { inner })
            .map_err(to_js_error)
    }

    /// Keep `rendered` if `invocation` is still the latest attempt.
    ///
    /// Returns `false` for stale results, which are dropped.
    pub fn commit(&mut self, invocation: &JsInvocation, rendered: JsBitmap) -> bool {
        self.inner
            .commit(invocation.inner.token(), rendered.into_bitmap())
    }

    /// Begin, run and commit in one call; returns a copy of the render.
    pub fn render(&mut self) -> Result<JsBitmap, JsValue> {
        self.inner
            .render()
            .map(|rendered| JsBitmap::from_bitmap(rendered.clone()))
            .map_err(to_js_error)
    }

    /// A copy of the latest committed render, or `undefined`.
    pub fn rendered(&self) -> Option<JsBitmap> {
        self.inner.rendered().cloned().map(JsBitmap::from_bitmap)
    }

    /// Encode the latest committed render with the output settings.
    pub fn export(&self) -> Result<JsEncodedImage, JsValue> {
        self.inner
            .export()
            .map(JsEncodedImage::from_encoded)
            .map_err(to_js_error)
    }

    /// Suggested download name, e.g. `photo-rotated.png`.
    pub fn export_filename(&self, original: &str, suffix: &str) -> String {
        self.inner.export_filename(original, suffix)
    }

    /// Drop the image, layers and render.
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// `decode_image` under this session's decode limits. Does not change
    /// the source image.
    pub fn decode_image(&self, bytes: &[u8], hint: Option<String>) -> Result<JsBitmap, JsValue> {
        crate::decode::decode_with(bytes, hint.as_deref(), self.inner.config())
    }

    /// `combine_images` with this session's background, filter and size
    /// limits.
    pub fn combine_images(
        &self,
        images: &JsBitmapList,
        layout: JsValue,
    ) -> Result<JsBitmap, JsValue> {
        let layout = crate::transform::parse_layout(layout)?;
        crate::transform::combine_with(images.as_slice(), &layout, self.inner.config())
    }

    /// `make_collage` across this session's `collage_width`.
    pub fn make_collage(&self, images: &JsBitmapList, columns: u32) -> Result<JsBitmap, JsValue> {
        crate::transform::collage_with(images.as_slice(), columns, self.inner.config())
    }

    /// `composite_image` with this session's filter and size limits.
    pub fn composite_image(
        &self,
        base: &JsBitmap,
        overlay: &JsBitmap,
        x_percent: f64,
        y_percent: f64,
        scale: f64,
    ) -> Result<JsBitmap, JsValue> {
        crate::compose::composite_with(
            base,
            overlay,
            (x_percent, y_percent),
            scale,
            self.inner.config(),
        )
    }
}

/// Call the page's progress callback. An exception thrown by the callback is
/// logged to the console and does not interrupt decoding.
fn report_progress(callback: &js_sys::Function, fraction: f32) -> bool {
    match callback.call1(&JsValue::NULL, &JsValue::from_f64(f64::from(fraction))) {
        Ok(_) => true,
        Err(err) => {
            web_sys::console::warn_2(&JsValue::from_str("progress callback threw:"), &err);
            false
        }
    }
}

impl JsToolSession {
    pub(crate) fn from_config(config: PipelineConfig) -> Self {
        Self {
            inner: ToolSession::new(config),
        }
    }
}
