//! The RGBA bitmap every pipeline stage consumes and produces.

use image::RgbaImage;

use crate::error::PipelineError;

/// Bytes per RGBA sample.
pub const CHANNELS: usize = 4;

/// Hard ceiling on any bitmap a stage allocates: 2^28 pixels (1 GiB of RGBA).
///
/// Sessions normally enforce the smaller `PipelineConfig` limits first.
pub const MAX_PIXELS: u64 = 1 << 28;

/// A decoded RGBA8 bitmap.
///
/// Width and height are always at least 1 and the sample buffer is always
/// `width * height * 4` bytes, row-major, with straight (non-premultiplied)
/// alpha. Stages never mutate an input bitmap; they return a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Create a bitmap from raw RGBA samples.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidParameter` if either dimension is zero
    /// or the buffer length doesn't match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::invalid(
                "dimensions",
                format!("{width}x{height} bitmap must be at least 1x1"),
            ));
        }
        let expected = Self::byte_len(width, height).ok_or_else(|| {
            PipelineError::invalid(
                "dimensions",
                format!("{width}x{height} bitmap is too large to address"),
            )
        })?;
        if pixels.len() != expected {
            return Err(PipelineError::invalid(
                "pixels",
                format!("expected {expected} bytes (width * height * 4), got {}", pixels.len()),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Length of a `width × height` RGBA buffer, or `None` if it overflows `usize`.
    pub fn byte_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(CHANNELS)
    }

    /// Check that a `width × height` output can be allocated before a stage
    /// builds it.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidParameter` naming `stage` when either
    /// side exceeds `u32`, the pixel count exceeds [`MAX_PIXELS`], or the
    /// buffer length overflows `usize`.
    pub fn ensure_allocatable(
        stage: &'static str,
        width: u64,
        height: u64,
    ) -> Result<(u32, u32), PipelineError> {
        let too_large = || {
            PipelineError::invalid(
                stage,
                format!("output of {width}x{height} exceeds the {MAX_PIXELS} pixel limit"),
            )
        };
        let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(too_large());
        };
        match width.checked_mul(height) {
            Some(pixels) if pixels <= MAX_PIXELS => {}
            _ => return Err(too_large()),
        }
        Self::byte_len(w, h).ok_or_else(too_large)?;
        Ok((w, h))
    }

    /// Create a bitmap filled with a single RGBA value.
    ///
    /// Dimensions of zero are raised to 1.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let pixels = rgba.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a fully transparent bitmap.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 0])
    }

    /// Internal constructor for buffers produced by stage code.
    pub(crate) fn from_raw_parts(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert!(width > 0 && height > 0, "Bitmap must be at least 1x1");
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * CHANNELS,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Wrap an `image::RgbaImage` produced by an `imageops` call.
    pub(crate) fn from_rgba_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_raw_parts(width, height, img.into_raw())
    }

    /// Copy into an `image::RgbaImage` for `imageops` processing.
    pub(crate) fn to_rgba_image(&self) -> RgbaImage {
        // Length is guaranteed by construction, so from_raw cannot fail here.
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGBA samples, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[inline]
    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Read the sample at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is outside the bitmap.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    #[inline]
    pub(crate) fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.index(x, y);
        self.pixels[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// True if any pixel is not fully opaque.
    pub fn has_transparency(&self) -> bool {
        self.pixels.chunks_exact(CHANNELS).any(|px| px[3] < 255)
    }

    /// Copy a sub-rectangle. The caller guarantees the rectangle is in bounds.
    pub(crate) fn copy_region(&self, x: u32, y: u32, width: u32, height: u32) -> Bitmap {
        let row_bytes = width as usize * CHANNELS;
        let mut output = Vec::with_capacity(row_bytes * height as usize);
        for row in y..y + height {
            let start = self.index(x, row);
            output.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        Bitmap::from_raw_parts(width, height, output)
    }
}

impl TryFrom<RgbaImage> for Bitmap {
    type Error = PipelineError;

    fn try_from(img: RgbaImage) -> Result<Self, Self::Error> {
        let (width, height) = img.dimensions();
        Bitmap::from_rgba(width, height, img.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_valid() {
        let bmp = Bitmap::from_rgba(2, 3, vec![0u8; 2 * 3 * 4]).unwrap();
        assert_eq!(bmp.dimensions(), (2, 3));
        assert_eq!(bmp.pixel_count(), 6);
    }

    #[test]
    fn test_from_rgba_rejects_zero_dimensions() {
        assert!(Bitmap::from_rgba(0, 10, vec![]).is_err());
        assert!(Bitmap::from_rgba(10, 0, vec![]).is_err());
    }

    #[test]
    fn test_from_rgba_rejects_length_mismatch() {
        let result = Bitmap::from_rgba(2, 2, vec![0u8; 15]);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidParameter { name: "pixels", .. })
        ));
    }

    #[test]
    fn test_from_rgba_rejects_unaddressable_size() {
        let result = Bitmap::from_rgba(u32::MAX, u32::MAX, Vec::new());
        assert!(matches!(
            result,
            Err(PipelineError::InvalidParameter { name: "dimensions", .. })
        ));
        assert_eq!(Bitmap::byte_len(u32::MAX, u32::MAX), None);
        assert_eq!(Bitmap::byte_len(3, 2), Some(24));
    }

    #[test]
    fn test_ensure_allocatable() {
        assert_eq!(Bitmap::ensure_allocatable("resize", 640, 480).unwrap(), (640, 480));
        assert_eq!(
            Bitmap::ensure_allocatable("resize", 1 << 14, 1 << 14).unwrap(),
            (1 << 14, 1 << 14)
        );
        assert!(Bitmap::ensure_allocatable("resize", (1 << 14) + 1, 1 << 14).is_err());
        assert!(Bitmap::ensure_allocatable("border", u64::from(u32::MAX) + 1, 1).is_err());
        assert!(matches!(
            Bitmap::ensure_allocatable("scale", u64::MAX, u64::MAX),
            Err(PipelineError::InvalidParameter { name: "scale", .. })
        ));
    }

    #[test]
    fn test_filled_and_pixel_access() {
        let bmp = Bitmap::filled(3, 2, [10, 20, 30, 255]);
        assert_eq!(bmp.pixel(2, 1), [10, 20, 30, 255]);
        assert!(!bmp.has_transparency());
        assert!(Bitmap::transparent(1, 1).has_transparency());
    }

    #[test]
    fn test_copy_region() {
        let mut bmp = Bitmap::transparent(4, 4);
        bmp.put_pixel(2, 1, [1, 2, 3, 4]);
        let region = bmp.copy_region(1, 1, 2, 2);
        assert_eq!(region.dimensions(), (2, 2));
        assert_eq!(region.pixel(1, 0), [1, 2, 3, 4]);
    }

    #[test]
    fn test_rgba_image_round_trip() {
        let bmp = Bitmap::filled(5, 7, [1, 2, 3, 4]);
        let img = bmp.to_rgba_image();
        assert_eq!(Bitmap::try_from(img).unwrap(), bmp);
    }
}
