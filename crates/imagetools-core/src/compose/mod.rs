//! Compositing stages: alpha blending, image overlays, text and flattening.

mod blend;
mod overlay;
mod text;

pub use blend::{blend_pixel, copy_into, draw_over, flatten};
pub use overlay::composite;
pub use text::{draw_text, measure_text, meme_text, Font, TextOverlay};
