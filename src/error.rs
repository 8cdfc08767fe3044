//! Error type shared by every codec component
//!
//! All failures are synchronous validation failures; none are retryable.
//! Each variant carries the context a caller needs to explain the problem.

use serde_json::{json, Value};
use thiserror::Error;

/// A codec failure with its structured payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesignError {
    /// Design code has a character outside the alphabet or the wrong grouping
    #[error("invalid design code '{code}'")]
    MalformedCode {
        code: String,
        /// Pattern a valid code matches
        pattern: String,
    },
    /// Numeric id has no 12-symbol code
    #[error("design id {id} is out of range (must be below {limit})")]
    IdOutOfRange { id: u64, limit: u64 },
    /// A layer raster differs from the slot's declared size
    #[error("layer {slot} was not {exp_w}×{exp_h} (got {act_w}×{act_h})", exp_w = expected.0, exp_h = expected.1, act_w = actual.0, act_h = actual.1)]
    LayerSizeMismatch {
        slot: String,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    /// A required slot has no raster
    #[error("payload was missing one or more layers. First missing layer: \"{slot}\" ({variant})")]
    MissingLayer { slot: String, variant: String },
    /// A raster was supplied for a slot the variant does not have
    #[error("invalid layer name '{name}' (valid: {})", valid.join(", "))]
    UnknownLayer { name: String, valid: Vec<String> },
    /// Packed buffer does not hold exactly one tile
    #[error("packed bitmap is {actual} bytes, expected {expected}")]
    ByteLengthMismatch { expected: usize, actual: usize },
    /// Index array does not hold exactly one tile
    #[error("index array has {actual} pixels, expected {expected}")]
    PixelCountMismatch { expected: usize, actual: usize },
    /// Pixel index does not fit in a nibble
    #[error("palette index {index} does not fit in 4 bits")]
    InvalidPaletteIndex { index: u8 },
    /// Pixel index has no palette entry
    #[error("palette index {index} has no color")]
    UnmappedPaletteIndex { index: u8 },
    /// Splitting would exceed the tile budget
    #[error("the uploaded image would create {tiles} tiles, which is greater than the limit, {max}")]
    TooManyTiles { tiles: usize, max: usize },
    /// Source raster is smaller than one tile along some axis
    #[error("image {w}×{h} is smaller than one {tile_w}×{tile_h} tile", w = size.0, h = size.1, tile_w = tile.0, tile_h = tile.1)]
    ImageTooSmall { size: (u32, u32), tile: (u32, u32) },
    /// No variant has this type code or name
    #[error("invalid design type '{key}'")]
    UnknownVariant { key: String },
    /// Layer index outside the design's layer list
    #[error("invalid layer index {index} (design has {num_layers} layers)")]
    InvalidLayerIndex { index: usize, num_layers: usize },
    /// Design name too long once the tile suffix is added
    #[error("the name provided was too long. Maximum in this case is {max_len} characters")]
    NameTooLong { name: String, max_len: usize },
}

impl DesignError {
    /// Stable numeric code for API consumers
    pub fn code(&self) -> u16 {
        match self {
            DesignError::MalformedCode { .. } => 202,
            DesignError::IdOutOfRange { .. } => 203,
            DesignError::InvalidLayerIndex { .. } => 206,
            DesignError::UnknownLayer { .. } => 207,
            DesignError::UnknownVariant { .. } => 208,
            DesignError::InvalidPaletteIndex { .. } => 211,
            DesignError::UnmappedPaletteIndex { .. } => 213,
            DesignError::LayerSizeMismatch { .. } => 305,
            DesignError::TooManyTiles { .. } => 306,
            DesignError::ImageTooSmall { .. } => 308,
            DesignError::MissingLayer { .. } => 309,
            DesignError::ByteLengthMismatch { .. } => 310,
            DesignError::PixelCountMismatch { .. } => 311,
            DesignError::NameTooLong { .. } => 312,
        }
    }

    /// Structured payload: message, code, and the variant's own fields.
    pub fn context(&self) -> Value {
        let mut value = json!({
            "error": self.to_string(),
            "error_code": self.code(),
        });
        let extra = match self {
            DesignError::MalformedCode { code, pattern } => {
                json!({ "design_code": code, "validation_regex": pattern })
            }
            DesignError::IdOutOfRange { id, limit } => json!({ "design_id": id, "limit": limit }),
            DesignError::LayerSizeMismatch { slot, expected, actual } => json!({
                "layer_name": slot,
                "expected_width": expected.0,
                "expected_height": expected.1,
                "actual_width": actual.0,
                "actual_height": actual.1,
            }),
            DesignError::MissingLayer { slot, variant } => {
                json!({ "layer_name": slot, "design_type": variant })
            }
            DesignError::UnknownLayer { name, valid } => {
                json!({ "layer_name": name, "valid_layer_names": valid })
            }
            DesignError::ByteLengthMismatch { expected, actual }
            | DesignError::PixelCountMismatch { expected, actual } => {
                json!({ "expected_length": expected, "actual_length": actual })
            }
            DesignError::InvalidPaletteIndex { index }
            | DesignError::UnmappedPaletteIndex { index } => json!({ "index": index }),
            DesignError::TooManyTiles { tiles, max } => json!({ "num_tiles": tiles, "max_tiles": max }),
            DesignError::ImageTooSmall { size, tile } => json!({
                "width": size.0,
                "height": size.1,
                "tile_width": tile.0,
                "tile_height": tile.1,
            }),
            DesignError::UnknownVariant { key } => json!({ "design_type": key }),
            DesignError::InvalidLayerIndex { index, num_layers } => {
                json!({ "index": index, "num_layers": num_layers })
            }
            DesignError::NameTooLong { name, max_len } => json!({ "name": name, "max_length": max_len }),
        };
        if let (Value::Object(base), Value::Object(fields)) = (&mut value, extra) {
            base.extend(fields);
        }
        value
    }
}
