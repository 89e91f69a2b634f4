//! Per-tool editing state.
//!
//! A [`ToolSession`] owns the loaded source image and the latest committed
//! render. The browser re-renders on every slider move; each attempt starts
//! with [`ToolSession::begin`], which hands out a fresh [`InvocationToken`].
//! Only the result of the most recent invocation may be committed, so a slow
//! render that finishes after a newer one is dropped instead of overwriting
//! it.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::bitmap::Bitmap;
use crate::compose::Font;
use crate::config::PipelineConfig;
use crate::decode::{read_metadata, DecodeRequest, DecoderRegistry, ImageMetadata, SourceImage};
use crate::encode::{export_filename, EncodedImage, OutputSpec};
use crate::error::{PipelineError, Result};
use crate::pipeline::{run_transforms, RenderedImage, StageContext, TransformSpec};

/// Identifies one render attempt. Tokens increase monotonically per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvocationToken(u64);

impl InvocationToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A snapshot of everything one render needs, detached from the session.
///
/// Running it doesn't borrow the session, so the session can move on (load
/// another file, change parameters) while a render is in flight.
#[derive(Debug, Clone)]
pub struct Invocation {
    token: InvocationToken,
    source: SourceImage,
    spec: TransformSpec,
    layers: Arc<Vec<Bitmap>>,
    font: Option<Font>,
    config: PipelineConfig,
}

impl Invocation {
    pub fn token(&self) -> InvocationToken {
        self.token
    }

    /// Run the transform stages against the snapshot.
    pub fn run(&self) -> Result<RenderedImage> {
        let ctx = StageContext::new(&self.config)
            .with_layers(&self.layers)
            .with_font(self.font.as_ref());
        run_transforms(self.source.bitmap(), &self.spec, &ctx)
    }
}

/// State for one open tool.
#[derive(Debug, Default)]
pub struct ToolSession {
    config: PipelineConfig,
    registry: DecoderRegistry,
    source: Option<SourceImage>,
    metadata: Option<ImageMetadata>,
    layers: Arc<Vec<Bitmap>>,
    font: Option<Font>,
    spec: TransformSpec,
    output: OutputSpec,
    latest: u64,
    rendered: Option<RenderedImage>,
}

impl ToolSession {
    pub fn new(config: PipelineConfig) -> Self {
        let output = OutputSpec::jpeg(config.default_quality);
        Self {
            config,
            output,
            ..Self::default()
        }
    }

    /// A session that delegates HEIC, PSD, TIFF and PDF input to `registry`.
    pub fn with_registry(config: PipelineConfig, registry: DecoderRegistry) -> Self {
        Self {
            registry,
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry_mut(&mut self) -> &mut DecoderRegistry {
        &mut self.registry
    }

    /// Decode `bytes` and make it the session's source image.
    ///
    /// On success the previous source and render are dropped and every
    /// outstanding token becomes stale. On failure the session is left
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// `Decode` for unreadable input, `ExternalToolFailure` when a delegated
    /// decoder fails.
    pub fn load(
        &mut self,
        bytes: &[u8],
        hint: Option<&str>,
        progress: &mut dyn FnMut(f32),
    ) -> Result<&SourceImage> {
        let source = self.registry.decode(
            bytes,
            hint,
            &DecodeRequest::default(),
            &self.config,
            progress,
        )?;
        // Metadata is informational; a file whose EXIF block is damaged still loads.
        let metadata = read_metadata(bytes, hint).ok();
        Ok(self.replace_source(source, metadata))
    }

    /// Use an already decoded bitmap as the source (canvas input).
    pub fn load_bitmap(&mut self, bitmap: Bitmap) -> &SourceImage {
        let source = SourceImage::new(bitmap, Default::default());
        self.replace_source(source, None)
    }

    fn replace_source(
        &mut self,
        source: SourceImage,
        metadata: Option<ImageMetadata>,
    ) -> &SourceImage {
        self.invalidate();
        self.rendered = None;
        self.metadata = metadata;
        debug!(
            format = %source.format(),
            width = source.width(),
            height = source.height(),
            "loaded source image"
        );
        self.source.insert(source)
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// EXIF metadata of the loaded file, when it had any readable metadata.
    pub fn metadata(&self) -> Option<&ImageMetadata> {
        self.metadata.as_ref()
    }

    /// Add an image for `Composite` stages; returns its layer index.
    pub fn add_layer(&mut self, bitmap: Bitmap) -> usize {
        let layers = Arc::make_mut(&mut self.layers);
        layers.push(bitmap);
        layers.len() - 1
    }

    pub fn clear_layers(&mut self) {
        self.layers = Arc::default();
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = Some(font);
    }

    pub fn set_spec(&mut self, spec: TransformSpec) {
        self.spec = spec;
    }

    pub fn spec(&self) -> &TransformSpec {
        &self.spec
    }

    pub fn set_output(&mut self, output: OutputSpec) {
        self.output = output;
    }

    pub fn output(&self) -> &OutputSpec {
        &self.output
    }

    /// Start a render attempt against the current state.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when no source image is loaded.
    pub fn begin(&mut self) -> Result<Invocation> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| PipelineError::invalid("source", "no image loaded"))?;
        self.latest += 1;
        Ok(Invocation {
            token: InvocationToken(self.latest),
            source,
            spec: self.spec.clone(),
            layers: Arc::clone(&self.layers),
            font: self.font.clone(),
            config: self.config.clone(),
        })
    }

    /// True if `token` belongs to the most recent invocation.
    pub fn is_current(&self, token: InvocationToken) -> bool {
        token.0 == self.latest && self.source.is_some()
    }

    /// Store `rendered` if `token` is still current.
    ///
    /// Returns `false` (and keeps the previous render) for a stale token.
    pub fn commit(&mut self, token: InvocationToken, rendered: RenderedImage) -> bool {
        if !self.is_current(token) {
            warn!(
                token = token.0,
                latest = self.latest,
                "discarding stale render"
            );
            return false;
        }
        self.rendered = Some(rendered);
        true
    }

    /// Begin, run and commit in one step.
    ///
    /// # Errors
    ///
    /// Any stage error; the previously committed render is kept.
    pub fn render(&mut self) -> Result<&RenderedImage> {
        let invocation = self.begin()?;
        let rendered = invocation.run()?;
        Ok(self.rendered.insert(rendered))
    }

    /// The latest committed render.
    pub fn rendered(&self) -> Option<&RenderedImage> {
        self.rendered.as_ref()
    }

    /// Encode the committed render with the session's output spec.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when nothing has been rendered yet, otherwise the
    /// encoder's error.
    pub fn export(&self) -> Result<EncodedImage> {
        let rendered = self
            .rendered
            .as_ref()
            .ok_or_else(|| PipelineError::invalid("render", "nothing has been rendered yet"))?;
        Ok(crate::encode::encode(
            rendered,
            &self.output,
            self.config.flatten_background,
        )?)
    }

    /// Suggested download name for the export, e.g. `photo-rotated.png`.
    pub fn export_filename(&self, original: &str, suffix: &str) -> String {
        export_filename(original, suffix, self.output.format())
    }

    /// Drop the source, layers and render; outstanding tokens become stale.
    pub fn reset(&mut self) {
        self.invalidate();
        self.source = None;
        self.metadata = None;
        self.rendered = None;
        self.clear_layers();
        self.spec = TransformSpec::identity();
        debug!("session reset");
    }

    fn invalidate(&mut self) {
        self.latest += 1;
    }
}
