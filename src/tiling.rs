//! Splitting oversized uploads into a grid of tiles and putting them back.

use image::{imageops, RgbaImage};

use crate::config::CodecConfig;
use crate::error::DesignError;
use crate::palette::TRANSPARENT;

/// One cell of a split raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Zero-based column in the grid
    pub column: u32,
    /// Zero-based row in the grid
    pub row: u32,
    /// One-based row-major position, used in tile names
    pub position: usize,
    /// The cropped pixels, exactly one tile in size
    pub image: RgbaImage,
}

/// Grid dimensions `(columns, rows)` a raster of `size` would split into.
///
/// Partial tiles at the right and bottom edges are not counted.
pub fn grid_size(size: (u32, u32), config: &CodecConfig) -> (u32, u32) {
    let (tile_w, tile_h) = config.tile_size();
    (size.0 / tile_w, size.1 / tile_h)
}

/// Number of tiles a raster of `size` would split into.
pub fn tile_count(size: (u32, u32), config: &CodecConfig) -> usize {
    let (cols, rows) = grid_size(size, config);
    cols as usize * rows as usize
}

/// Cut `image` into tiles, row by row.
///
/// Pixels past the last whole tile are discarded.
pub fn split(image: &RgbaImage, config: &CodecConfig) -> Result<Vec<Tile>, DesignError> {
    let (tile_w, tile_h) = config.tile_size();
    let (cols, rows) = grid_size(image.dimensions(), config);

    let tiles = cols as usize * rows as usize;
    if tiles == 0 {
        return Err(DesignError::ImageTooSmall {
            size: image.dimensions(),
            tile: (tile_w, tile_h),
        });
    }
    if tiles > config.codec.max_tiles {
        return Err(DesignError::TooManyTiles { tiles, max: config.codec.max_tiles });
    }

    let mut out = Vec::with_capacity(tiles);
    for row in 0..rows {
        for column in 0..cols {
            let view = imageops::crop_imm(image, column * tile_w, row * tile_h, tile_w, tile_h);
            out.push(Tile {
                column,
                row,
                position: out.len() + 1,
                image: view.to_image(),
            });
        }
    }
    Ok(out)
}

/// Place tiles back into a `cols`×`rows` grid.
///
/// Each tile lands at its own `(column, row)`; cells without a tile stay
/// transparent and tiles outside the grid are ignored.
pub fn reassemble(tiles: &[Tile], cols: u32, rows: u32, config: &CodecConfig) -> RgbaImage {
    let (tile_w, tile_h) = config.tile_size();
    let mut sheet = RgbaImage::from_pixel(cols * tile_w, rows * tile_h, TRANSPARENT);

    for tile in tiles {
        if tile.column >= cols || tile.row >= rows {
            continue;
        }
        imageops::replace(
            &mut sheet,
            &tile.image,
            (tile.column * tile_w) as i64,
            (tile.row * tile_h) as i64,
        );
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Every pixel encodes its own coordinates
    fn coordinate_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn test_split_64_square_into_four() {
        let config = CodecConfig::default();
        let image = coordinate_image(64, 64);
        let tiles = split(&image, &config).unwrap();

        assert_eq!(tiles.len(), 4);
        let cells: Vec<(u32, u32, usize)> = tiles.iter().map(|t| (t.column, t.row, t.position)).collect();
        assert_eq!(cells, vec![(0, 0, 1), (1, 0, 2), (0, 1, 3), (1, 1, 4)]);
        assert_eq!(*tiles[3].image.get_pixel(0, 0), Rgba([32, 32, 0, 255]));
        assert!(tiles.iter().all(|t| t.image.dimensions() == (32, 32)));
    }

    #[test]
    fn test_split_discards_remainder() {
        let config = CodecConfig::default();
        let tiles = split(&coordinate_image(70, 40), &config).unwrap();
        assert_eq!(tiles.len(), 2);
        assert_eq!(*tiles[1].image.get_pixel(31, 31), Rgba([63, 31, 0, 255]));
    }

    #[test]
    fn test_split_too_small() {
        let config = CodecConfig::default();
        assert_eq!(
            split(&coordinate_image(31, 64), &config),
            Err(DesignError::ImageTooSmall { size: (31, 64), tile: (32, 32) })
        );
    }

    #[test]
    fn test_split_too_many_tiles() {
        let config = CodecConfig::default();
        // 7 x 5 = 35 tiles
        let image = RgbaImage::new(7 * 32, 5 * 32);
        assert_eq!(split(&image, &config), Err(DesignError::TooManyTiles { tiles: 35, max: 30 }));
    }

    #[test]
    fn test_split_exactly_at_budget() {
        let config = CodecConfig::default();
        let image = RgbaImage::new(6 * 32, 5 * 32);
        assert_eq!(tile_count(image.dimensions(), &config), 30);
        assert_eq!(split(&image, &config).unwrap().len(), 30);
    }

    #[test]
    fn test_reassemble_is_exact() {
        let config = CodecConfig::default();
        let image = coordinate_image(96, 64);
        let tiles = split(&image, &config).unwrap();
        let (cols, rows) = grid_size(image.dimensions(), &config);
        assert_eq!((cols, rows), (3, 2));
        assert_eq!(reassemble(&tiles, cols, rows, &config), image);
    }

    #[test]
    fn test_reassemble_missing_tile_is_transparent() {
        let config = CodecConfig::default();
        let tiles = split(&coordinate_image(64, 32), &config).unwrap();
        let sheet = reassemble(&tiles[..1], 2, 1, &config);
        assert_eq!(*sheet.get_pixel(40, 0), TRANSPARENT);
        assert_eq!(*sheet.get_pixel(5, 5), Rgba([5, 5, 0, 255]));
    }
}
