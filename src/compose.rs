//! Layer compositing
//!
//! Decoded layers are stacked back to front with porter-duff "source over".

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::config::CodecConfig;
use crate::error::DesignError;
use crate::palette::TRANSPARENT;

/// Blend `src` over `dst`.
pub(crate) fn blend_pixels(src: &Rgba<u8>, dst: &Rgba<u8>) -> Rgba<u8> {
    let src_alpha = src[3] as f32 / 255.0;
    let dst_alpha = dst[3] as f32 / 255.0;

    // out_alpha = src_alpha + dst_alpha * (1 - src_alpha)
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha == 0.0 {
        return TRANSPARENT;
    }

    let composite = |s: u8, d: u8| -> u8 {
        let s = s as f32 / 255.0;
        let d = d as f32 / 255.0;
        let result = (s * src_alpha + d * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        (result.clamp(0.0, 1.0) * 255.0).round() as u8
    };

    Rgba([
        composite(src[0], dst[0]),
        composite(src[1], dst[1]),
        composite(src[2], dst[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

fn draw_pixel(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    // Fully transparent source, skip
    if src[3] == 0 {
        return;
    }
    *dst = if src[3] == 255 { *src } else { blend_pixels(src, dst) };
}

/// Draw `layer` over `canvas` in place. Both must have the same size.
fn blit(canvas: &mut RgbaImage, layer: &RgbaImage) {
    for (dst, src) in canvas.pixels_mut().zip(layer.pixels()) {
        draw_pixel(dst, src);
    }
}

/// Composite layers, first entry at the back.
///
/// All layers must share one size; an empty list yields a transparent
/// tile-sized canvas.
pub fn compose(layers: &[&RgbaImage], config: &CodecConfig) -> Result<RgbaImage, DesignError> {
    let Some(first) = layers.first() else {
        let (w, h) = config.tile_size();
        return Ok(RgbaImage::from_pixel(w, h, TRANSPARENT));
    };

    let size = first.dimensions();
    let mut canvas = RgbaImage::from_pixel(size.0, size.1, TRANSPARENT);
    for (i, layer) in layers.iter().enumerate() {
        if layer.dimensions() != size {
            return Err(DesignError::LayerSizeMismatch {
                slot: i.to_string(),
                expected: size,
                actual: layer.dimensions(),
            });
        }
        blit(&mut canvas, layer);
    }
    Ok(canvas)
}

/// Scale `image` to `size` (nearest neighbour) and draw it over `canvas`
/// with its top-left corner at `pos`. Pixels past the canvas edge are dropped.
pub fn draw_scaled(canvas: &mut RgbaImage, image: &RgbaImage, pos: (u32, u32), size: (u32, u32)) {
    if size.0 == 0 || size.1 == 0 {
        return;
    }
    let scaled = imageops::resize(image, size.0, size.1, FilterType::Nearest);
    let (width, height) = canvas.dimensions();
    for (x, y, src) in scaled.enumerate_pixels() {
        let (cx, cy) = (pos.0 + x, pos.1 + y);
        if cx < width && cy < height {
            draw_pixel(canvas.get_pixel_mut(cx, cy), src);
        }
    }
}
