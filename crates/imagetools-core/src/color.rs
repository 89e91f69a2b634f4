//! RGB colors used by borders, text, rings and background flattening.
//!
//! Colors arrive from the UI either as `#RGB` / `#RRGGBB` strings (color
//! pickers) or as `{ r, g, b }` objects; both deserialize into [`Rgb`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// An opaque 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The color as an opaque RGBA sample.
    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }

    /// Parse a hex color string.
    ///
    /// Supports both `#RGB` and `#RRGGBB`; the leading `#` is optional.
    pub fn parse_hex(hex: &str) -> Result<Self, PipelineError> {
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);

        // Slicing below is by byte, so everything must be a single-byte hex digit.
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PipelineError::invalid(
                "color",
                format!("invalid hex digit in {hex:?}"),
            ));
        }

        let channel = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|_| {
                PipelineError::invalid("color", format!("invalid hex digit in {hex:?}"))
            })
        };

        match digits.len() {
            3 => {
                // Each digit is doubled: 0xF -> 0xFF
                let r = channel(&digits[0..1])?;
                let g = channel(&digits[1..2])?;
                let b = channel(&digits[2..3])?;
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            n => Err(PipelineError::invalid(
                "color",
                format!("expected #RGB or #RRGGBB, got {n} hex digits"),
            )),
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Channels { r: u8, g: u8, b: u8 },
}

impl TryFrom<ColorRepr> for Rgb {
    type Error = PipelineError;

    fn try_from(repr: ColorRepr) -> Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(hex) => Rgb::parse_hex(&hex),
            ColorRepr::Channels { r, g, b } => Ok(Rgb::new(r, g, b)),
        }
    }
}
