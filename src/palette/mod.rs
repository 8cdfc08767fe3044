//! Shared design palettes.
//!
//! A palette has 16 slots addressed by a 4-bit index. Slot 15 always renders
//! fully transparent whatever is stored there, leaving at most 15 usable
//! colors for every layer of a design.

mod quantize;

use std::collections::{BTreeMap, HashMap};

use image::{Rgba, RgbaImage};

use crate::config::{CodecConfig, ColorSpace, PALETTE_SLOTS, TRANSPARENT_INDEX};
use crate::error::DesignError;

pub use quantize::Color;
use quantize::{find_closest_color, median_cut};

/// Fully transparent pixel
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pack a color as `0xRRGGBBAA`, the layout used in design documents.
pub fn rgba_to_u32(color: Rgba<u8>) -> u32 {
    u32::from_be_bytes(color.0)
}

/// Inverse of [`rgba_to_u32`].
pub fn u32_to_rgba(value: u32) -> Rgba<u8> {
    Rgba(value.to_be_bytes())
}

/// Up to 15 colors plus the implicit transparent slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    slots: [Option<Rgba<u8>>; PALETTE_SLOTS - 1],
}

impl Palette {
    /// Palette holding `colors` at indices 0.. in order. Colors past slot 14
    /// are dropped.
    pub fn from_colors(colors: &[Rgba<u8>]) -> Self {
        let mut palette = Palette::default();
        for (slot, color) in palette.slots.iter_mut().zip(colors) {
            *slot = Some(*color);
        }
        palette
    }

    /// Parse the document form: string index → `0xRRGGBBAA`.
    ///
    /// An entry for slot 15 is accepted and ignored.
    pub fn from_wire(entries: &BTreeMap<String, u32>) -> Result<Self, DesignError> {
        let mut palette = Palette::default();
        for (key, value) in entries {
            let index: u8 = match key.parse() {
                Ok(i) => i,
                Err(_) => {
                    log::warn!("Ignoring palette entry with non-numeric key '{}'", key);
                    continue;
                }
            };
            if index > TRANSPARENT_INDEX {
                return Err(DesignError::InvalidPaletteIndex { index });
            }
            if index == TRANSPARENT_INDEX {
                continue;
            }
            palette.slots[index as usize] = Some(u32_to_rgba(*value));
        }
        Ok(palette)
    }

    /// Document form of this palette.
    pub fn to_wire(&self) -> BTreeMap<String, u32> {
        self.entries().map(|(i, c)| (i.to_string(), rgba_to_u32(c))).collect()
    }

    /// Populated slots in index order, slot 15 excluded.
    pub fn entries(&self) -> impl Iterator<Item = (u8, Rgba<u8>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|c| (i as u8, c)))
    }

    /// Number of populated non-transparent slots (never above 15)
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Color for a pixel index. Index 15 is always transparent.
    pub fn resolve(&self, index: u8) -> Result<Rgba<u8>, DesignError> {
        if index == TRANSPARENT_INDEX {
            return Ok(TRANSPARENT);
        }
        match self.slots.get(index as usize) {
            Some(Some(color)) => Ok(*color),
            Some(None) => Err(DesignError::UnmappedPaletteIndex { index }),
            None => Err(DesignError::InvalidPaletteIndex { index }),
        }
    }
}

/// Palette plus per-raster indices produced by [`PaletteBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedLayers {
    /// The shared palette
    pub palette: Palette,
    /// One row-major index array per input raster
    pub indices: Vec<Vec<u8>>,
    /// Whether colors had to be merged to fit the budget
    pub was_quantized: bool,
    /// Distinct non-transparent colors before any reduction
    pub natural_colors: usize,
}

/// Derives one shared palette for a set of rasters.
#[derive(Debug, Clone, Copy)]
pub struct PaletteBuilder {
    budget: usize,
    space: ColorSpace,
}

impl PaletteBuilder {
    pub fn new(config: &CodecConfig) -> Self {
        Self {
            budget: config.codec.palette_size.min(PALETTE_SLOTS - 1),
            space: config.quantize.color_space,
        }
    }

    /// Build the palette and index every raster against it.
    ///
    /// Alpha-0 pixels map to index 15 regardless of their RGB value.
    pub fn build(&self, rasters: &[&RgbaImage]) -> IndexedLayers {
        // First-seen order keeps small palettes stable across runs
        let mut order: Vec<Color> = Vec::new();
        let mut counts: HashMap<Color, u32> = HashMap::new();
        for raster in rasters {
            for pixel in raster.pixels() {
                let color = Color::from_rgba(*pixel);
                if color.is_transparent() {
                    continue;
                }
                let count = counts.entry(color).or_insert(0);
                if *count == 0 {
                    order.push(color);
                }
                *count += 1;
            }
        }

        let natural_colors = order.len();
        let was_quantized = natural_colors > self.budget;

        let (palette_colors, mapping): (Vec<Color>, HashMap<Color, u8>) = if was_quantized {
            let weighted: Vec<(Color, u32)> = order.iter().map(|c| (*c, counts[c])).collect();
            let reps = median_cut(&weighted, self.budget, self.space);
            let mapping = order
                .iter()
                .map(|c| (*c, find_closest_color(*c, &reps, self.space) as u8))
                .collect();
            (reps, mapping)
        } else {
            let mapping = order.iter().enumerate().map(|(i, c)| (*c, i as u8)).collect();
            (order, mapping)
        };

        log::debug!(
            "Palette: {} natural colors, {} entries, quantized: {}",
            natural_colors,
            palette_colors.len(),
            was_quantized
        );

        let indices = rasters
            .iter()
            .map(|raster| {
                raster
                    .pixels()
                    .map(|pixel| {
                        let color = Color::from_rgba(*pixel);
                        if color.is_transparent() {
                            TRANSPARENT_INDEX
                        } else {
                            mapping[&color]
                        }
                    })
                    .collect()
            })
            .collect();

        let colors: Vec<Rgba<u8>> = palette_colors.iter().map(|c| c.to_rgba()).collect();
        IndexedLayers {
            palette: Palette::from_colors(&colors),
            indices,
            was_quantized,
            natural_colors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(color))
    }

    /// One distinct color per pixel, `n` pixels in a row.
    fn gradient(n: u32) -> RgbaImage {
        RgbaImage::from_fn(n, 1, |x, _| Rgba([(x * 12) as u8, 255 - (x * 7) as u8, (x * 3) as u8, 255]))
    }

    #[test]
    fn test_wire_round_trip() {
        assert_eq!(rgba_to_u32(Rgba([0x12, 0x34, 0x56, 0x78])), 0x12345678);
        assert_eq!(u32_to_rgba(0xFF0000FF), Rgba([255, 0, 0, 255]));

        let palette = Palette::from_colors(&[Rgba([1, 2, 3, 255]), Rgba([4, 5, 6, 255])]);
        let wire = palette.to_wire();
        assert_eq!(wire["0"], 0x010203FF);
        assert_eq!(Palette::from_wire(&wire).unwrap(), palette);
    }

    #[test]
    fn test_from_wire_ignores_slot_15() {
        let mut wire = BTreeMap::new();
        wire.insert("0".to_string(), 0xFFFFFFFF);
        wire.insert("15".to_string(), 0x00FF00FF);
        let palette = Palette::from_wire(&wire).unwrap();
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.resolve(15).unwrap(), TRANSPARENT);
    }

    #[test]
    fn test_from_wire_rejects_wide_index() {
        let mut wire = BTreeMap::new();
        wire.insert("16".to_string(), 0xFFFFFFFF);
        assert_eq!(Palette::from_wire(&wire), Err(DesignError::InvalidPaletteIndex { index: 16 }));
    }

    #[test]
    fn test_resolve_errors() {
        let palette = Palette::from_colors(&[Rgba([9, 9, 9, 255])]);
        assert_eq!(palette.resolve(0).unwrap(), Rgba([9, 9, 9, 255]));
        assert_eq!(palette.resolve(3), Err(DesignError::UnmappedPaletteIndex { index: 3 }));
        assert_eq!(palette.resolve(16), Err(DesignError::InvalidPaletteIndex { index: 16 }));
    }

    #[test]
    fn test_small_palette_kept_exactly() {
        let builder = PaletteBuilder::new(&CodecConfig::default());
        let red = solid(2, 2, [255, 0, 0, 255]);
        let blue = solid(2, 2, [0, 0, 255, 255]);
        let result = builder.build(&[&red, &blue]);

        assert!(!result.was_quantized);
        assert_eq!(result.natural_colors, 2);
        assert_eq!(result.palette.resolve(0).unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(result.palette.resolve(1).unwrap(), Rgba([0, 0, 255, 255]));
        assert_eq!(result.indices, vec![vec![0; 4], vec![1; 4]]);
    }

    #[test]
    fn test_transparent_pixels_map_to_15() {
        let builder = PaletteBuilder::new(&CodecConfig::default());
        let mut image = solid(2, 1, [10, 20, 30, 255]);
        image.put_pixel(1, 0, Rgba([200, 100, 50, 0]));
        let result = builder.build(&[&image]);

        assert_eq!(result.indices[0], vec![0, TRANSPARENT_INDEX]);
        assert_eq!(result.palette.len(), 1);
    }

    #[test]
    fn test_exactly_fifteen_not_quantized() {
        let builder = PaletteBuilder::new(&CodecConfig::default());
        let result = builder.build(&[&gradient(15)]);
        assert!(!result.was_quantized);
        assert_eq!(result.palette.len(), 15);
        assert_eq!(result.indices[0], (0..15).collect::<Vec<u8>>());
    }

    #[test]
    fn test_sixteen_colors_quantized() {
        let builder = PaletteBuilder::new(&CodecConfig::default());
        let result = builder.build(&[&gradient(16)]);
        assert!(result.was_quantized);
        assert_eq!(result.natural_colors, 16);
        assert_eq!(result.palette.len(), 15);
        assert!(result.indices[0].iter().all(|i| *i < 15));
    }

    #[test]
    fn test_solid_plus_twenty_colors() {
        let builder = PaletteBuilder::new(&CodecConfig::default());
        let base = solid(32, 32, [240, 240, 240, 255]);
        let busy = RgbaImage::from_fn(32, 32, |x, y| {
            let i = ((y * 32 + x) % 20) as u8;
            Rgba([i * 12, 100, 255 - i * 12, 255])
        });
        let result = builder.build(&[&base, &busy]);

        assert!(result.was_quantized);
        assert_eq!(result.natural_colors, 21);
        assert!(result.palette.len() <= 15);
        for layer in &result.indices {
            for index in layer {
                assert!(result.palette.resolve(*index).is_ok());
            }
        }
    }

    #[test]
    fn test_quantization_is_deterministic() {
        let builder = PaletteBuilder::new(&CodecConfig::default());
        let image = RgbaImage::from_fn(16, 16, |x, y| Rgba([(x * 16) as u8, (y * 16) as u8, 128, 255]));
        let first = builder.build(&[&image]);
        let second = builder.build(&[&image]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_smaller_budget_from_config() {
        let mut config = CodecConfig::default();
        config.codec.palette_size = 4;
        let result = PaletteBuilder::new(&config).build(&[&gradient(10)]);
        assert!(result.was_quantized);
        assert_eq!(result.palette.len(), 4);
    }
}
