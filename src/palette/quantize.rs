//! Color reduction using the median cut algorithm.
//!
//! Works in perceptual LAB space by default, or plain RGB. Alpha is carried as
//! a fourth axis so semi-transparent colors stay apart from their opaque
//! counterparts. Output is deterministic for identical input.

use std::cmp::Ordering;

use image::Rgba;

use crate::config::ColorSpace;

/// An RGBA color usable as a map key and sortable by its packed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn from_rgba(rgba: Rgba<u8>) -> Self {
        Self { r: rgba[0], g: rgba[1], b: rgba[2], a: rgba[3] }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

/// LAB color representation for perceptual color quantization.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LabColor {
    pub l: f64, // Lightness: 0-100
    pub a: f64, // Green-Red axis: -128 to 127
    pub b: f64, // Blue-Yellow axis: -128 to 127
}

impl LabColor {
    /// Convert RGB color to LAB color space (D65 illuminant).
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r_lin = srgb_to_linear(r as f64 / 255.0);
        let g_lin = srgb_to_linear(g as f64 / 255.0);
        let b_lin = srgb_to_linear(b as f64 / 255.0);

        let x = r_lin * 0.4124564 + g_lin * 0.3575761 + b_lin * 0.1804375;
        let y = r_lin * 0.2126729 + g_lin * 0.7151522 + b_lin * 0.0721750;
        let z = r_lin * 0.0193339 + g_lin * 0.1191920 + b_lin * 0.9503041;

        // D65 reference white point
        let x_n = 0.95047;
        let y_n = 1.00000;
        let z_n = 1.08883;

        let fx = lab_f(x / x_n);
        let fy = lab_f(y / y_n);
        let fz = lab_f(z / z_n);

        Self { l: 116.0 * fy - 16.0, a: 500.0 * (fx - fy), b: 200.0 * (fy - fz) }
    }
}

/// sRGB gamma expansion (inverse companding).
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// LAB f function for XYZ to LAB conversion.
fn lab_f(t: f64) -> f64 {
    let delta: f64 = 6.0 / 29.0;
    if t > delta.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * delta * delta) + 4.0 / 29.0
    }
}

/// Position of a color along the quantizer's four axes.
pub(crate) fn coords(color: Color, space: ColorSpace) -> [f64; 4] {
    match space {
        ColorSpace::Lab => {
            let lab = LabColor::from_rgb(color.r, color.g, color.b);
            // Alpha scaled to the lightness range
            [lab.l, lab.a, lab.b, color.a as f64 * 100.0 / 255.0]
        }
        ColorSpace::Rgb => [color.r as f64, color.g as f64, color.b as f64, color.a as f64],
    }
}

fn distance_sq(p: &[f64; 4], q: &[f64; 4]) -> f64 {
    p.iter().zip(q.iter()).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// A box of colors for the median cut.
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<(Color, [f64; 4], u32)>, // Original color, coordinates, pixel count
}

impl ColorBox {
    fn new(colors: Vec<(Color, [f64; 4], u32)>) -> Self {
        Self { colors }
    }

    /// Axis with the largest range.
    fn widest_axis(&self) -> usize {
        let mut min = [f64::MAX; 4];
        let mut max = [f64::MIN; 4];
        for (_, c, _) in &self.colors {
            for axis in 0..4 {
                min[axis] = min[axis].min(c[axis]);
                max[axis] = max[axis].max(c[axis]);
            }
        }

        let mut widest = 0;
        for axis in 1..4 {
            if max[axis] - min[axis] > max[widest] - min[widest] {
                widest = axis;
            }
        }
        widest
    }

    /// Split the box into two at the pixel-weighted median of its widest axis.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let axis = self.widest_axis();

        // Ties fall back to the packed color so the order is total
        self.colors.sort_by(|(c1, p1, _), (c2, p2, _)| {
            p1[axis].partial_cmp(&p2[axis]).unwrap_or(Ordering::Equal).then_with(|| c1.cmp(c2))
        });

        let total: u64 = self.colors.iter().map(|(_, _, count)| *count as u64).sum();
        let mut running = 0u64;
        let mut split_idx = self.colors.len() / 2;

        for (i, (_, _, count)) in self.colors.iter().enumerate() {
            running += *count as u64;
            if running >= total / 2 {
                split_idx = (i + 1).min(self.colors.len() - 1);
                break;
            }
        }

        // Ensure we don't create empty boxes
        split_idx = split_idx.max(1).min(self.colors.len() - 1);

        let right = self.colors.split_off(split_idx);
        (ColorBox::new(self.colors), ColorBox::new(right))
    }

    /// The member color closest to the box's weighted mean.
    ///
    /// Picking a real member keeps representatives of different boxes distinct.
    fn representative(&self) -> Color {
        let total: f64 = self.colors.iter().map(|(_, _, count)| *count as f64).sum();
        let mut mean = [0.0f64; 4];
        for (_, c, count) in &self.colors {
            for axis in 0..4 {
                mean[axis] += c[axis] * *count as f64;
            }
        }
        for value in &mut mean {
            *value /= total;
        }

        self.colors
            .iter()
            .min_by(|(c1, p1, _), (c2, p2, _)| {
                distance_sq(&mean, p1)
                    .partial_cmp(&distance_sq(&mean, p2))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| c1.cmp(c2))
            })
            .map(|(c, _, _)| *c)
            .unwrap_or(Color { r: 0, g: 0, b: 0, a: 255 })
    }

    fn pixel_count(&self) -> u64 {
        self.colors.iter().map(|(_, _, count)| *count as u64).sum()
    }
}

/// Reduce non-transparent colors to at most `max_colors` representatives.
///
/// `colors` holds each distinct color with its pixel count; transparent
/// entries are ignored. When the input already fits it is returned sorted.
pub(crate) fn median_cut(
    colors: &[(Color, u32)],
    max_colors: usize,
    space: ColorSpace,
) -> Vec<Color> {
    let mut opaque: Vec<(Color, [f64; 4], u32)> = colors
        .iter()
        .filter(|(c, _)| !c.is_transparent())
        .map(|(c, count)| (*c, coords(*c, space), *count))
        .collect();
    opaque.sort_by(|a, b| a.0.cmp(&b.0));
    opaque.dedup_by(|a, b| a.0 == b.0);

    if opaque.len() <= max_colors {
        return opaque.into_iter().map(|(c, _, _)| c).collect();
    }
    if max_colors == 0 {
        return Vec::new();
    }

    let mut boxes = vec![ColorBox::new(opaque)];

    while boxes.len() < max_colors {
        // Split the splittable box holding the most pixels; first one wins ties
        let mut best: Option<(usize, u64)> = None;
        for (i, b) in boxes.iter().enumerate() {
            if b.colors.len() < 2 {
                continue;
            }
            let count = b.pixel_count();
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((i, count));
            }
        }
        let Some((idx, _)) = best else {
            break;
        };

        let (left, right) = boxes.remove(idx).split();
        boxes.insert(idx, right);
        boxes.insert(idx, left);
    }

    boxes.iter().map(ColorBox::representative).collect()
}

/// Index of the palette color nearest to `color` in the given space.
pub(crate) fn find_closest_color(color: Color, palette: &[Color], space: ColorSpace) -> usize {
    let target = coords(color, space);
    palette
        .iter()
        .enumerate()
        .map(|(i, p)| (i, distance_sq(&target, &coords(*p, space))))
        .min_by(|(i1, d1), (i2, d2)| d1.partial_cmp(d2).unwrap_or(Ordering::Equal).then(i1.cmp(i2)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
