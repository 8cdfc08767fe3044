//! The closed table of design variants.
//!
//! Every variant is plain data: its user-facing parts with fixed sizes, how
//! many tile-sized layers it packs into, and the copy regions that map parts
//! onto layers. Parts can be larger than a tile (long bodies, caps) or smaller
//! (sleeves); the packed layers are always exactly one tile.

use std::collections::BTreeMap;
use std::fmt;

use image::{imageops, Rgba, RgbaImage};
use serde::Serialize;

pub use crate::config::LAYER_SIZE;
use crate::error::DesignError;
use crate::palette::TRANSPARENT;

/// Size of the net image canvas
pub const NET_SIZE: (u32, u32) = (240, 240);

/// Frame drawn around the basic design's net image
pub const NET_FRAME: Rgba<u8> = Rgba([0xF3, 0xF5, 0xE7, 0xFF]);

/// Type code of the single-layer basic design
pub const BASIC_TYPE_CODE: u32 = 99;

/// User-facing rasters keyed by part name
pub type Parts = BTreeMap<String, RgbaImage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Basic,
    Tops,
    DressUp,
    Headwear,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Basic => "Basic",
            Category::Tops => "Tops",
            Category::DressUp => "Dress-up",
            Category::Headwear => "Headwear",
        };
        f.write_str(name)
    }
}

/// A named slot with fixed dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl Part {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// A rectangle copied between a part and a packed layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Packed layer index
    pub layer: usize,
    pub part: &'static str,
    /// Top-left corner inside the layer
    pub layer_pos: (u32, u32),
    /// Top-left corner inside the part
    pub part_pos: (u32, u32),
    pub size: (u32, u32),
}

/// Where a part is drawn on the net image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub part: &'static str,
    /// Top-left corner on the net canvas
    pub pos: (u32, u32),
    /// Size the part is scaled to
    pub size: (u32, u32),
}

const fn part(name: &'static str, size: (u32, u32)) -> Part {
    Part { name, width: size.0, height: size.1 }
}

const fn region(
    layer: usize,
    part: &'static str,
    layer_pos: (u32, u32),
    part_pos: (u32, u32),
    size: (u32, u32),
) -> Region {
    Region { layer, part, layer_pos, part_pos, size }
}

const fn place(part: &'static str, pos: (u32, u32), size: (u32, u32)) -> Placement {
    Placement { part, pos, size }
}

const STANDARD: (u32, u32) = LAYER_SIZE;
const SHORT_SLEEVE: (u32, u32) = (22, 13);
const LONG_SLEEVE: (u32, u32) = (22, 22);
const WIDE_SLEEVE: (u32, u32) = (30, 22);
const LONG_BODY: (u32, u32) = (32, 41);
const BODY_TAIL: (u32, u32) = (32, 9);

const STANDARD_BODY_REGIONS: &[Region] = &[
    region(0, "back", (0, 0), (0, 0), STANDARD),
    region(1, "front", (0, 0), (0, 0), STANDARD),
];

// Rows past the first tile of a long body go to the top of layers 2 and 3.
const LONG_BODY_REGIONS: &[Region] = &[
    region(0, "front", (0, 0), (0, 0), STANDARD),
    region(2, "front", (0, 0), (0, 32), BODY_TAIL),
    region(1, "back", (0, 0), (0, 0), STANDARD),
    region(3, "back", (0, 0), (0, 32), BODY_TAIL),
];

const SHORT_SLEEVE_REGIONS: &[Region] = &[
    region(2, "right-sleeve", (5, 10), (0, 0), SHORT_SLEEVE),
    region(3, "left-sleeve", (5, 10), (0, 0), SHORT_SLEEVE),
];

const LONG_SLEEVE_REGIONS: &[Region] = &[
    region(2, "right-sleeve", (5, 10), (0, 0), LONG_SLEEVE),
    region(3, "left-sleeve", (5, 10), (0, 0), LONG_SLEEVE),
];

const WIDE_SLEEVE_REGIONS: &[Region] = &[
    region(2, "right-sleeve", (1, 10), (0, 0), WIDE_SLEEVE),
    region(3, "left-sleeve", (1, 10), (0, 0), WIDE_SLEEVE),
];

const BRIMMED_CAP_REGIONS: &[Region] = &[
    region(0, "front", (0, 0), (0, 0), STANDARD),
    region(1, "front", (0, 0), (32, 0), (12, 32)),
    region(2, "front", (0, 0), (0, 32), (32, 9)),
    region(3, "front", (0, 0), (32, 32), (12, 9)),
    region(1, "back", (12, 0), (0, 0), (20, 32)),
    region(3, "back", (12, 0), (0, 32), (20, 12)),
    region(2, "brim", (0, 11), (0, 0), (32, 21)),
    region(3, "brim", (0, 11), (32, 0), (12, 21)),
];

const KNIT_CAP_REGIONS: &[Region] = &[
    region(0, "cap", (0, 0), (0, 0), STANDARD),
    region(1, "cap", (0, 0), (32, 0), STANDARD),
    region(2, "cap", (0, 0), (0, 32), (32, 21)),
    region(3, "cap", (0, 0), (32, 32), (32, 21)),
];

const BRIMMED_HAT_REGIONS: &[Region] = &[
    region(0, "top", (14, 0), (0, 0), (18, 32)),
    region(1, "top", (0, 0), (18, 0), (18, 32)),
    region(2, "top", (14, 0), (0, 32), (18, 4)),
    region(3, "top", (0, 0), (18, 32), (18, 4)),
    region(2, "middle", (0, 4), (0, 0), (32, 19)),
    region(3, "middle", (0, 4), (32, 0), (32, 19)),
    region(2, "bottom", (0, 23), (0, 0), (32, 9)),
    region(3, "bottom", (0, 23), (32, 0), (32, 9)),
];

const BASIC_NET: &[Placement] = &[place("0", (5, 5), (230, 230))];

const STANDARD_BODY_NET: &[Placement] = &[
    place("back", (6, 6), (112, 113)),
    place("front", (121, 6), (113, 113)),
];

const LONG_BODY_NET: &[Placement] = &[
    place("back", (6, 6), (112, 145)),
    place("front", (121, 6), (113, 145)),
];

const SHORT_SLEEVE_NET: &[Placement] = &[
    place("right-sleeve", (26, 157), (72, 44)),
    place("left-sleeve", (141, 157), (72, 44)),
];

const LONG_SLEEVE_NET: &[Placement] = &[
    place("right-sleeve", (26, 157), (72, 77)),
    place("left-sleeve", (141, 157), (72, 77)),
];

const WIDE_SLEEVE_NET: &[Placement] = &[
    place("right-sleeve", (10, 157), (105, 77)),
    place("left-sleeve", (125, 157), (105, 77)),
];

const BRIMMED_CAP_NET: &[Placement] = &[
    place("front", (8, 4), (151, 146)),
    place("brim", (9, 163), (150, 69)),
    place("back", (166, 13), (66, 147)),
];

const KNIT_CAP_NET: &[Placement] = &[place("cap", (6, 10), (228, 182))];

const BRIMMED_HAT_NET: &[Placement] = &[
    place("top", (59, 9), (121, 121)),
    place("middle", (6, 138), (228, 62)),
    place("bottom", (6, 206), (228, 26)),
];

const BASIC_PARTS: &[Part] = &[part("0", STANDARD)];
const STANDARD_BODY_PARTS: &[Part] = &[part("back", STANDARD), part("front", STANDARD)];
const SHORT_SLEEVE_TOP_PARTS: &[Part] = &[
    part("back", STANDARD),
    part("front", STANDARD),
    part("right-sleeve", SHORT_SLEEVE),
    part("left-sleeve", SHORT_SLEEVE),
];
const LONG_SLEEVE_TOP_PARTS: &[Part] = &[
    part("back", STANDARD),
    part("front", STANDARD),
    part("right-sleeve", LONG_SLEEVE),
    part("left-sleeve", LONG_SLEEVE),
];
const SLEEVELESS_DRESS_PARTS: &[Part] = &[part("back", LONG_BODY), part("front", LONG_BODY)];
const SHORT_SLEEVE_DRESS_PARTS: &[Part] = &[
    part("back", LONG_BODY),
    part("front", LONG_BODY),
    part("right-sleeve", SHORT_SLEEVE),
    part("left-sleeve", SHORT_SLEEVE),
];
const LONG_SLEEVE_DRESS_PARTS: &[Part] = &[
    part("back", LONG_BODY),
    part("front", LONG_BODY),
    part("right-sleeve", LONG_SLEEVE),
    part("left-sleeve", LONG_SLEEVE),
];
const ROBE_PARTS: &[Part] = &[
    part("back", LONG_BODY),
    part("front", LONG_BODY),
    part("right-sleeve", WIDE_SLEEVE),
    part("left-sleeve", WIDE_SLEEVE),
];
const BRIMMED_CAP_PARTS: &[Part] = &[part("front", (44, 41)), part("back", (20, 44)), part("brim", (44, 21))];
const KNIT_CAP_PARTS: &[Part] = &[part("cap", (64, 53))];
const BRIMMED_HAT_PARTS: &[Part] = &[part("top", (36, 36)), part("middle", (64, 19)), part("bottom", (64, 9))];

/// Descriptor of one design kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    pub type_code: u32,
    /// Kebab-case lookup name
    pub name: &'static str,
    pub display_name: &'static str,
    pub category: Category,
    pub parts: &'static [Part],
    /// Number of packed tile-sized layers
    pub layers: usize,
    /// Copy regions; empty when every part is exactly one layer, in order
    pub regions: &'static [&'static [Region]],
    /// Net image layout, drawn in order
    pub net: &'static [&'static [Placement]],
}

const fn variant(
    type_code: u32,
    name: &'static str,
    display_name: &'static str,
    category: Category,
    parts: &'static [Part],
    layers: usize,
    regions: &'static [&'static [Region]],
    net: &'static [&'static [Placement]],
) -> Variant {
    Variant { type_code, name, display_name, category, parts, layers, regions, net }
}

static VARIANTS: &[Variant] = &[
    variant(BASIC_TYPE_CODE, "basic", "Basic design", Category::Basic, BASIC_PARTS, 1, &[], &[BASIC_NET]),
    variant(
        100,
        "long-sleeve-dress-shirt",
        "Long-sleeve dress shirt",
        Category::Tops,
        LONG_SLEEVE_TOP_PARTS,
        4,
        &[STANDARD_BODY_REGIONS, LONG_SLEEVE_REGIONS],
        &[STANDARD_BODY_NET, LONG_SLEEVE_NET],
    ),
    variant(
        101,
        "short-sleeve-tee",
        "Short-sleeve tee",
        Category::Tops,
        SHORT_SLEEVE_TOP_PARTS,
        4,
        &[STANDARD_BODY_REGIONS, SHORT_SLEEVE_REGIONS],
        &[STANDARD_BODY_NET, SHORT_SLEEVE_NET],
    ),
    variant(
        102,
        "tank-top",
        "Tank top",
        Category::Tops,
        STANDARD_BODY_PARTS,
        2,
        &[],
        &[STANDARD_BODY_NET],
    ),
    variant(
        103,
        "sweater",
        "Sweater",
        Category::Tops,
        LONG_SLEEVE_TOP_PARTS,
        4,
        &[STANDARD_BODY_REGIONS, LONG_SLEEVE_REGIONS],
        &[STANDARD_BODY_NET, LONG_SLEEVE_NET],
    ),
    variant(
        104,
        "hoodie",
        "Hoodie",
        Category::Tops,
        LONG_SLEEVE_TOP_PARTS,
        4,
        &[STANDARD_BODY_REGIONS, LONG_SLEEVE_REGIONS],
        &[STANDARD_BODY_NET, LONG_SLEEVE_NET],
    ),
    variant(
        105,
        "coat",
        "Coat",
        Category::Tops,
        LONG_SLEEVE_DRESS_PARTS,
        4,
        &[LONG_BODY_REGIONS, LONG_SLEEVE_REGIONS],
        &[LONG_BODY_NET, LONG_SLEEVE_NET],
    ),
    variant(
        106,
        "short-sleeve-dress",
        "Short-sleeve dress",
        Category::DressUp,
        SHORT_SLEEVE_DRESS_PARTS,
        4,
        &[LONG_BODY_REGIONS, SHORT_SLEEVE_REGIONS],
        &[LONG_BODY_NET, SHORT_SLEEVE_NET],
    ),
    variant(
        107,
        "sleeveless-dress",
        "Sleeveless dress",
        Category::DressUp,
        SLEEVELESS_DRESS_PARTS,
        4,
        &[LONG_BODY_REGIONS],
        &[LONG_BODY_NET],
    ),
    variant(
        108,
        "long-sleeve-dress",
        "Long-sleeve dress",
        Category::DressUp,
        LONG_SLEEVE_DRESS_PARTS,
        4,
        &[LONG_BODY_REGIONS, LONG_SLEEVE_REGIONS],
        &[LONG_BODY_NET, LONG_SLEEVE_NET],
    ),
    variant(
        109,
        "balloon-hem-dress",
        "Balloon-hem dress",
        Category::DressUp,
        SHORT_SLEEVE_DRESS_PARTS,
        4,
        &[LONG_BODY_REGIONS, SHORT_SLEEVE_REGIONS],
        &[LONG_BODY_NET, SHORT_SLEEVE_NET],
    ),
    variant(
        110,
        "round-dress",
        "Round dress",
        Category::DressUp,
        SHORT_SLEEVE_DRESS_PARTS,
        4,
        &[LONG_BODY_REGIONS, SHORT_SLEEVE_REGIONS],
        &[LONG_BODY_NET, SHORT_SLEEVE_NET],
    ),
    variant(
        111,
        "robe",
        "Robe",
        Category::DressUp,
        ROBE_PARTS,
        4,
        &[LONG_BODY_REGIONS, WIDE_SLEEVE_REGIONS],
        &[LONG_BODY_NET, WIDE_SLEEVE_NET],
    ),
    variant(
        112,
        "brimmed-cap",
        "Brimmed cap",
        Category::Headwear,
        BRIMMED_CAP_PARTS,
        4,
        &[BRIMMED_CAP_REGIONS],
        &[BRIMMED_CAP_NET],
    ),
    variant(
        113,
        "knit-cap",
        "Knit cap",
        Category::Headwear,
        KNIT_CAP_PARTS,
        4,
        &[KNIT_CAP_REGIONS],
        &[KNIT_CAP_NET],
    ),
    variant(
        114,
        "brimmed-hat",
        "Brimmed hat",
        Category::Headwear,
        BRIMMED_HAT_PARTS,
        4,
        &[BRIMMED_HAT_REGIONS],
        &[BRIMMED_HAT_NET],
    ),
];

impl Variant {
    /// Every known variant, ordered by type code.
    pub fn all() -> &'static [Variant] {
        VARIANTS
    }

    pub fn by_type_code(type_code: u32) -> Result<&'static Variant, DesignError> {
        VARIANTS
            .iter()
            .find(|v| v.type_code == type_code)
            .ok_or_else(|| DesignError::UnknownVariant { key: type_code.to_string() })
    }

    pub fn by_name(name: &str) -> Result<&'static Variant, DesignError> {
        VARIANTS
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| DesignError::UnknownVariant { key: name.to_string() })
    }

    /// Look up by type code when `key` is numeric, by name otherwise.
    pub fn lookup(key: &str) -> Result<&'static Variant, DesignError> {
        match key.parse::<u32>() {
            Ok(code) => Self::by_type_code(code),
            Err(_) => Self::by_name(key),
        }
    }

    /// Multi-layer ("pro") designs are every variant but the basic one.
    pub fn is_pro(&self) -> bool {
        self.type_code != BASIC_TYPE_CODE
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn part_names(&self) -> Vec<String> {
        self.parts.iter().map(|p| p.name.to_string()).collect()
    }

    fn regions(&self) -> impl Iterator<Item = &'static Region> {
        self.regions.iter().flat_map(|group| group.iter())
    }

    /// Net image placements in drawing order.
    pub fn placements(&self) -> impl Iterator<Item = &'static Placement> {
        self.net.iter().flat_map(|group| group.iter())
    }

    /// Canvas color behind the net image: framed for the basic design,
    /// transparent for garments.
    pub fn net_backdrop(&self) -> Rgba<u8> {
        if self.is_pro() {
            TRANSPARENT
        } else {
            NET_FRAME
        }
    }

    /// Check that `parts` holds exactly this variant's slots at their sizes.
    pub fn validate(&self, parts: &Parts) -> Result<(), DesignError> {
        for part in self.parts {
            let image = parts.get(part.name).ok_or_else(|| DesignError::MissingLayer {
                slot: part.name.to_string(),
                variant: self.name.to_string(),
            })?;
            if image.dimensions() != part.size() {
                return Err(DesignError::LayerSizeMismatch {
                    slot: part.name.to_string(),
                    expected: part.size(),
                    actual: image.dimensions(),
                });
            }
        }

        if let Some(extra) = parts.keys().find(|name| self.part(name).is_none()) {
            return Err(DesignError::UnknownLayer {
                name: extra.clone(),
                valid: self.part_names(),
            });
        }
        Ok(())
    }

    /// Cut validated parts into the packed layer rasters.
    pub fn internalize(&self, parts: &Parts) -> Result<Vec<RgbaImage>, DesignError> {
        self.validate(parts)?;

        if self.regions.is_empty() {
            return Ok(self.parts.iter().map(|p| parts[p.name].clone()).collect());
        }

        let mut layers = vec![RgbaImage::from_pixel(LAYER_SIZE.0, LAYER_SIZE.1, TRANSPARENT); self.layers];
        for r in self.regions() {
            let source = &parts[r.part];
            let view = imageops::crop_imm(source, r.part_pos.0, r.part_pos.1, r.size.0, r.size.1);
            imageops::replace(
                &mut layers[r.layer],
                &view.to_image(),
                r.layer_pos.0 as i64,
                r.layer_pos.1 as i64,
            );
        }
        Ok(layers)
    }

    /// Rebuild the user-facing parts from packed layer rasters, in part order.
    pub fn externalize(&self, layers: &[RgbaImage]) -> Result<Vec<(&'static str, RgbaImage)>, DesignError> {
        if layers.len() != self.layers {
            return Err(DesignError::MissingLayer {
                slot: layers.len().to_string(),
                variant: self.name.to_string(),
            });
        }
        for (i, layer) in layers.iter().enumerate() {
            if layer.dimensions() != LAYER_SIZE {
                return Err(DesignError::LayerSizeMismatch {
                    slot: i.to_string(),
                    expected: LAYER_SIZE,
                    actual: layer.dimensions(),
                });
            }
        }

        if self.regions.is_empty() {
            return Ok(self.parts.iter().map(|p| p.name).zip(layers.iter().cloned()).collect());
        }

        let mut out: Vec<(&'static str, RgbaImage)> = self
            .parts
            .iter()
            .map(|p| (p.name, RgbaImage::from_pixel(p.width, p.height, TRANSPARENT)))
            .collect();
        for r in self.regions() {
            let view = imageops::crop_imm(&layers[r.layer], r.layer_pos.0, r.layer_pos.1, r.size.0, r.size.1);
            if let Some((_, target)) = out.iter_mut().find(|(name, _)| *name == r.part) {
                imageops::replace(target, &view.to_image(), r.part_pos.0 as i64, r.part_pos.1 as i64);
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.type_code)
    }
}
