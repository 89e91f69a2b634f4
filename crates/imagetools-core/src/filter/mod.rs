//! Pixel-level stages. Dimensions never change; every function returns a
//! new bitmap.

mod blur;
mod color;
mod color_key;
mod pixelate;
mod threshold;

pub use blur::{blur, blur_sigma};
pub use color::{brightness, contrast, grayscale, invert, luma, sepia, LUMA_B, LUMA_G, LUMA_R};
pub use color_key::color_key;
pub use pixelate::pixelate;
pub use threshold::threshold;
