//! 4-bit-per-pixel tile bitmaps
//!
//! A packed tile stores two palette indices per byte. The first pixel of each
//! pair sits in the low nibble and the second in the high nibble, row-major.

use image::RgbaImage;

use crate::config::{CodecConfig, TRANSPARENT_INDEX};
use crate::error::DesignError;
use crate::palette::Palette;

/// Packs and unpacks one tile's worth of palette indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapCodec {
    width: u32,
    height: u32,
}

impl BitmapCodec {
    pub fn new(config: &CodecConfig) -> Self {
        let (width, height) = config.tile_size();
        Self { width, height }
    }

    /// Tile dimensions this codec works on
    pub fn tile_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Pixels per tile
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Packed bytes per tile
    pub fn byte_count(&self) -> usize {
        self.pixel_count() / 2
    }

    /// Pack row-major indices into nibble pairs.
    pub fn pack(&self, indices: &[u8]) -> Result<Vec<u8>, DesignError> {
        if indices.len() != self.pixel_count() {
            return Err(DesignError::PixelCountMismatch {
                expected: self.pixel_count(),
                actual: indices.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|i| **i > TRANSPARENT_INDEX) {
            return Err(DesignError::InvalidPaletteIndex { index });
        }

        Ok(indices
            .chunks_exact(2)
            .map(|pair| pair[0] | (pair[1] << 4))
            .collect())
    }

    /// Expand packed bytes back to one index per pixel.
    pub fn unpack_indices(&self, bytes: &[u8]) -> Result<Vec<u8>, DesignError> {
        if bytes.len() != self.byte_count() {
            return Err(DesignError::ByteLengthMismatch {
                expected: self.byte_count(),
                actual: bytes.len(),
            });
        }

        let mut indices = Vec::with_capacity(self.pixel_count());
        for byte in bytes {
            indices.push(byte & 0x0F);
            indices.push(byte >> 4);
        }
        Ok(indices)
    }

    /// Decode packed bytes into a tile raster using `palette`.
    pub fn unpack(&self, bytes: &[u8], palette: &Palette) -> Result<RgbaImage, DesignError> {
        let indices = self.unpack_indices(bytes)?;

        let mut image = RgbaImage::new(self.width, self.height);
        for (pixel, index) in image.pixels_mut().zip(indices) {
            *pixel = palette.resolve(index)?;
        }
        Ok(image)
    }
}
