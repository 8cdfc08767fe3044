//! The encode path: rasters in, packed designs out.
//!
//! Parts are validated against their variant, cut into tile-sized layers,
//! quantized to one shared palette and packed. Oversized basic uploads can
//! instead be split into a grid of tiles, each encoded as its own design on
//! the rayon pool.

use image::RgbaImage;
use rayon::prelude::*;

use crate::bitmap::BitmapCodec;
use crate::config::CodecConfig;
use crate::design::{Design, DesignMeta, Layer};
use crate::error::DesignError;
use crate::output::fit_within;
use crate::palette::{PaletteBuilder, TRANSPARENT};
use crate::tiling::{grid_size, split};
use crate::variant::{Parts, Variant, BASIC_TYPE_CODE};

/// How a basic design upload is brought to tile size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FitMode {
    /// Pad smaller images with transparency; larger ones are rejected
    #[default]
    Pad,
    /// Shrink larger images to fit first, keeping the aspect ratio
    Scale,
}

impl FitMode {
    pub fn from_str(s: &str) -> Option<FitMode> {
        match s.to_lowercase().as_str() {
            "pad" => Some(FitMode::Pad),
            "scale" => Some(FitMode::Scale),
            _ => None,
        }
    }
}

/// A freshly encoded design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub design: Design,
    /// Whether colors were merged to fit the palette
    pub was_quantized: bool,
}

/// One encoded cell of a tiled upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTile {
    pub column: u32,
    pub row: u32,
    /// One-based row-major position
    pub position: usize,
    pub encoded: Encoded,
}

/// Bring a basic design upload to exactly one tile.
///
/// The image is anchored top-left; uncovered pixels are transparent.
pub fn fit_basic(image: &RgbaImage, mode: FitMode, config: &CodecConfig) -> Result<RgbaImage, DesignError> {
    let tile = config.tile_size();
    let (w, h) = image.dimensions();
    if (w, h) == tile {
        return Ok(image.clone());
    }

    let fitted = match mode {
        FitMode::Scale => fit_within(image, tile),
        FitMode::Pad if w > tile.0 || h > tile.1 => {
            return Err(DesignError::LayerSizeMismatch {
                slot: "0".to_string(),
                expected: tile,
                actual: (w, h),
            })
        }
        FitMode::Pad => image.clone(),
    };

    let mut canvas = RgbaImage::from_pixel(tile.0, tile.1, TRANSPARENT);
    image::imageops::replace(&mut canvas, &fitted, 0, 0);
    Ok(canvas)
}

/// Encode validated parts into a design.
pub fn encode_design(
    variant: &'static Variant,
    parts: &Parts,
    meta: DesignMeta,
    config: &CodecConfig,
) -> Result<Encoded, DesignError> {
    let layers = variant.internalize(parts)?;
    let refs: Vec<&RgbaImage> = layers.iter().collect();
    let indexed = PaletteBuilder::new(config).build(&refs);

    if indexed.was_quantized {
        log::warn!(
            "Design '{}' had {} colors; quantized to {}",
            meta.design_name,
            indexed.natural_colors,
            indexed.palette.len()
        );
    }

    let codec = BitmapCodec::new(config);
    let packed = indexed
        .indices
        .iter()
        .enumerate()
        .map(|(i, indices)| -> Result<Layer, DesignError> {
            Ok(Layer::new(i.to_string(), codec.tile_size(), codec.pack(indices)?))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Encoded {
        design: Design::new(variant, meta, indexed.palette, packed),
        was_quantized: indexed.was_quantized,
    })
}

/// Encode a single raster as a basic design.
pub fn encode_basic(
    image: &RgbaImage,
    mode: FitMode,
    meta: DesignMeta,
    config: &CodecConfig,
) -> Result<Encoded, DesignError> {
    let variant = Variant::by_type_code(BASIC_TYPE_CODE)?;
    let mut parts = Parts::new();
    parts.insert("0".to_string(), fit_basic(image, mode, config)?);
    encode_design(variant, &parts, meta, config)
}

/// Check that `name` plus the `" {tiles}"` suffix fits the name limit.
fn check_tile_name(name: &str, tiles: usize, config: &CodecConfig) -> Result<(), DesignError> {
    let overhead = if tiles > 1 { format!(" {}", tiles).len() } else { 0 };
    let max_len = config.codec.max_name_len.saturating_sub(overhead);
    if name.chars().count() > max_len {
        return Err(DesignError::NameTooLong { name: name.to_string(), max_len });
    }
    Ok(())
}

/// Split an oversized raster and encode every tile as a basic design.
///
/// Tiles are named `"{name} {position}"` when there is more than one.
/// Output keeps row-major order.
pub fn encode_tiled(image: &RgbaImage, meta: DesignMeta, config: &CodecConfig) -> Result<Vec<EncodedTile>, DesignError> {
    let tiles = split(image, config)?;
    check_tile_name(&meta.design_name, tiles.len(), config)?;

    let (cols, rows) = grid_size(image.dimensions(), config);
    log::info!(
        "Splitting {}x{} image into {} tiles ({}x{})",
        image.width(),
        image.height(),
        tiles.len(),
        cols,
        rows
    );

    let multiple = tiles.len() > 1;
    tiles
        .par_iter()
        .map(|tile| -> Result<EncodedTile, DesignError> {
            let mut tile_meta = meta.clone();
            if multiple {
                tile_meta.design_name = format!("{} {}", meta.design_name, tile.position);
            }
            let encoded = encode_basic(&tile.image, FitMode::Pad, tile_meta, config)?;
            Ok(EncodedTile {
                column: tile.column,
                row: tile.row,
                position: tile.position,
                encoded,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn meta(name: &str) -> DesignMeta {
        DesignMeta {
            design_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_fit_pads_top_left() {
        let config = CodecConfig::default();
        let image = RgbaImage::from_pixel(10, 5, Rgba([1, 2, 3, 255]));
        let fitted = fit_basic(&image, FitMode::Pad, &config).unwrap();
        assert_eq!(fitted.dimensions(), (32, 32));
        assert_eq!(*fitted.get_pixel(9, 4), Rgba([1, 2, 3, 255]));
        assert_eq!(*fitted.get_pixel(10, 4), TRANSPARENT);
        assert_eq!(*fitted.get_pixel(9, 5), TRANSPARENT);
    }

    #[test]
    fn test_fit_pad_rejects_large() {
        let config = CodecConfig::default();
        let image = RgbaImage::new(40, 32);
        assert!(matches!(
            fit_basic(&image, FitMode::Pad, &config),
            Err(DesignError::LayerSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_fit_scale_shrinks() {
        let config = CodecConfig::default();
        let image = RgbaImage::from_pixel(64, 32, Rgba([9, 9, 9, 255]));
        let fitted = fit_basic(&image, FitMode::Scale, &config).unwrap();
        assert_eq!(fitted.dimensions(), (32, 32));
        assert_eq!(*fitted.get_pixel(31, 15), Rgba([9, 9, 9, 255]));
        assert_eq!(*fitted.get_pixel(31, 16), TRANSPARENT);
    }

    #[test]
    fn test_encode_basic_round_trip() {
        let config = CodecConfig::default();
        let image = RgbaImage::from_fn(32, 32, |x, y| {
            if (x + y) % 3 == 0 {
                Rgba([200, 10, 10, 255])
            } else if x < 4 {
                TRANSPARENT
            } else {
                Rgba([10, 10, 200, 255])
            }
        });
        let encoded = encode_basic(&image, FitMode::Pad, meta("Check"), &config).unwrap();
        assert!(!encoded.was_quantized);
        assert_eq!(encoded.design.layers()[0].bytes().len(), 512);

        let decoded = encoded.design.render_layer(0, &BitmapCodec::new(&config)).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_encode_quantizes_many_colors() {
        let config = CodecConfig::default();
        let image = RgbaImage::from_fn(32, 32, |x, y| Rgba([(x * 8) as u8, (y * 8) as u8, 50, 255]));
        let encoded = encode_basic(&image, FitMode::Pad, meta("Noise"), &config).unwrap();
        assert!(encoded.was_quantized);
        assert!(encoded.design.palette().len() <= 15);
    }

    #[test]
    fn test_encode_pro_design() {
        let config = CodecConfig::default();
        let tee = Variant::by_name("short-sleeve-tee").unwrap();
        let parts: Parts = tee
            .parts
            .iter()
            .map(|p| (p.name.to_string(), RgbaImage::from_pixel(p.width, p.height, Rgba([0, 128, 0, 255]))))
            .collect();
        let encoded = encode_design(tee, &parts, meta("Tee"), &config).unwrap();

        let design = &encoded.design;
        assert_eq!(design.num_layers(), 4);
        assert!(design.to_document().meta.pro);
        let sleeve = design.render_part("left-sleeve", &BitmapCodec::new(&config)).unwrap();
        assert_eq!(sleeve.dimensions(), (22, 13));
        assert!(sleeve.pixels().all(|p| *p == Rgba([0, 128, 0, 255])));
    }

    #[test]
    fn test_encode_tiled_names_and_order() {
        let config = CodecConfig::default();
        let image = RgbaImage::from_fn(64, 64, |x, y| Rgba([(x / 32) as u8 * 100, (y / 32) as u8 * 100, 0, 255]));
        let tiles = encode_tiled(&image, meta("Mural"), &config).unwrap();

        assert_eq!(tiles.len(), 4);
        let names: Vec<&str> = tiles.iter().map(|t| t.encoded.design.meta().design_name.as_str()).collect();
        assert_eq!(names, vec!["Mural 1", "Mural 2", "Mural 3", "Mural 4"]);

        let codec = BitmapCodec::new(&config);
        let last = tiles[3].encoded.design.render_layer(0, &codec).unwrap();
        assert_eq!(*last.get_pixel(0, 0), Rgba([100, 100, 0, 255]));
        assert_eq!((tiles[1].column, tiles[1].row), (1, 0));
    }

    #[test]
    fn test_encode_tiled_single_tile_keeps_name() {
        let config = CodecConfig::default();
        let image = RgbaImage::new(40, 40);
        let tiles = encode_tiled(&image, meta("Solo"), &config).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].encoded.design.meta().design_name, "Solo");
    }

    #[test]
    fn test_encode_tiled_name_too_long() {
        let config = CodecConfig::default();
        let image = RgbaImage::new(64, 32);
        // 20 max, minus " 2"
        let result = encode_tiled(&image, meta("Nineteen characters"), &config);
        assert_eq!(
            result,
            Err(DesignError::NameTooLong {
                name: "Nineteen characters".to_string(),
                max_len: 18,
            })
        );
    }
}
