//! Configuration schema types for `design.toml`
//!
//! Defines the constants every codec component reads (code alphabet, tile
//! dimensions, palette and tile budgets) and the validation rules for them.

use serde::{Deserialize, Serialize};

/// Symbols used by design codes, in digit-value order.
pub const DEFAULT_ALPHABET: &str = "0123456789BCDFGHJKLMNPQRSTVWXY";

/// Number of hyphen-separated groups in a design code
pub const CODE_GROUPS: usize = 3;

/// Characters per group
pub const CODE_GROUP_LEN: usize = 4;

/// Total symbols in a design code (hyphens excluded)
pub const CODE_LEN: usize = CODE_GROUPS * CODE_GROUP_LEN;

/// Width and height of one packed design layer. Every variant table and the
/// basic design slot are laid out on this grid.
pub const LAYER_SIZE: (u32, u32) = (32, 32);

/// Slots addressable by one 4-bit index.
pub const PALETTE_SLOTS: usize = 16;

/// Palette slot that always renders fully transparent.
pub const TRANSPARENT_INDEX: u8 = 15;

/// Color space used when the palette has to be reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    /// CIE-LAB, distances are CIE76 delta E
    #[default]
    Lab,
    /// Plain sRGB, distances are squared channel differences
    Rgb,
}

impl ColorSpace {
    /// Parse a color space name
    pub fn from_str(s: &str) -> Option<ColorSpace> {
        match s.to_lowercase().as_str() {
            "lab" => Some(ColorSpace::Lab),
            "rgb" => Some(ColorSpace::Rgb),
            _ => None,
        }
    }
}

/// `[codec]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSection {
    /// Design code alphabet (30 distinct symbols)
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    /// Tile width in pixels, must match the packed layer width
    #[serde(default = "default_tile_dim")]
    pub tile_width: u32,
    /// Tile height in pixels, must match the packed layer height
    #[serde(default = "default_tile_dim")]
    pub tile_height: u32,
    /// Maximum opaque palette entries per design
    #[serde(default = "default_palette_size")]
    pub palette_size: usize,
    /// Maximum tiles a single source image may be split into
    #[serde(default = "default_max_tiles")]
    pub max_tiles: usize,
    /// Maximum design name length, including any tile suffix
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
}

impl Default for CodecSection {
    fn default() -> Self {
        Self {
            alphabet: default_alphabet(),
            tile_width: default_tile_dim(),
            tile_height: default_tile_dim(),
            palette_size: default_palette_size(),
            max_tiles: default_max_tiles(),
            max_name_len: default_max_name_len(),
        }
    }
}

fn default_alphabet() -> String {
    DEFAULT_ALPHABET.to_string()
}

fn default_tile_dim() -> u32 {
    LAYER_SIZE.0
}

fn default_palette_size() -> usize {
    15
}

fn default_max_tiles() -> usize {
    30
}

fn default_max_name_len() -> usize {
    20
}

/// `[quantize]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantizeSection {
    /// Color space for median cut and nearest-color matching
    #[serde(default)]
    pub color_space: ColorSpace,
}

/// Root configuration, built once and shared by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Codec constants
    #[serde(default)]
    pub codec: CodecSection,
    /// Quantizer settings
    #[serde(default)]
    pub quantize: QuantizeSection,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "codec.tile_width")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "design.toml: '{}' {}", self.field, self.message)
    }
}

impl CodecConfig {
    /// Tile dimensions as (width, height)
    pub fn tile_size(&self) -> (u32, u32) {
        (self.codec.tile_width, self.codec.tile_height)
    }

    /// Pixels in one tile
    pub fn tile_pixels(&self) -> usize {
        self.codec.tile_width as usize * self.codec.tile_height as usize
    }

    /// Packed bytes in one tile (two pixels per byte)
    pub fn tile_bytes(&self) -> usize {
        self.tile_pixels() / 2
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let codec = &self.codec;

        let symbols: Vec<char> = codec.alphabet.chars().collect();
        if symbols.len() != 30 {
            errors.push(ConfigValidationError {
                field: "codec.alphabet".to_string(),
                message: format!("must contain exactly 30 symbols, found {}", symbols.len()),
            });
        }
        if symbols.contains(&'-') {
            errors.push(ConfigValidationError {
                field: "codec.alphabet".to_string(),
                message: "must not contain '-'".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = symbols.iter().find(|c| !seen.insert(**c)) {
            errors.push(ConfigValidationError {
                field: "codec.alphabet".to_string(),
                message: format!("symbol '{}' appears more than once", dup),
            });
        }

        if codec.tile_width == 0 || codec.tile_height == 0 {
            errors.push(ConfigValidationError {
                field: "codec.tile_width".to_string(),
                message: "tile dimensions must be positive".to_string(),
            });
        } else if self.tile_pixels() % 2 != 0 {
            errors.push(ConfigValidationError {
                field: "codec.tile_width".to_string(),
                message: "tile pixel count must be even".to_string(),
            });
        } else if self.tile_size() != LAYER_SIZE {
            errors.push(ConfigValidationError {
                field: "codec.tile_width".to_string(),
                message: format!(
                    "tile must be {}x{} to match the packed layer size, found {}x{}",
                    LAYER_SIZE.0, LAYER_SIZE.1, codec.tile_width, codec.tile_height
                ),
            });
        }

        if codec.palette_size == 0 || codec.palette_size >= PALETTE_SLOTS {
            errors.push(ConfigValidationError {
                field: "codec.palette_size".to_string(),
                message: format!("must be between 1 and {}", PALETTE_SLOTS - 1),
            });
        }

        if codec.max_tiles == 0 {
            errors.push(ConfigValidationError {
                field: "codec.max_tiles".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        if codec.max_name_len == 0 {
            errors.push(ConfigValidationError {
                field: "codec.max_name_len".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CodecConfig::default();
        assert!(config.is_valid(), "{:?}", config.validate());
        assert_eq!(config.tile_size(), (32, 32));
        assert_eq!(config.tile_pixels(), 1024);
        assert_eq!(config.tile_bytes(), 512);
        assert_eq!(config.codec.palette_size, 15);
        assert_eq!(config.codec.max_tiles, 30);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: CodecConfig = toml::from_str(
            r#"
[codec]
max_tiles = 12
"#,
        )
        .expect("should parse");
        assert_eq!(config.codec.max_tiles, 12);
        assert_eq!(config.codec.alphabet, DEFAULT_ALPHABET);
        assert_eq!(config.quantize.color_space, ColorSpace::Lab);
    }

    #[test]
    fn test_color_space_from_toml() {
        let config: CodecConfig = toml::from_str("[quantize]\ncolor_space = \"rgb\"\n").expect("should parse");
        assert_eq!(config.quantize.color_space, ColorSpace::Rgb);
    }

    #[test]
    fn test_color_space_from_str() {
        assert_eq!(ColorSpace::from_str("LAB"), Some(ColorSpace::Lab));
        assert_eq!(ColorSpace::from_str("rgb"), Some(ColorSpace::Rgb));
        assert_eq!(ColorSpace::from_str("hsv"), None);
    }

    #[test]
    fn test_validate_short_alphabet() {
        let mut config = CodecConfig::default();
        config.codec.alphabet = "0123".to_string();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "codec.alphabet"));
    }

    #[test]
    fn test_validate_duplicate_symbol() {
        let mut config = CodecConfig::default();
        config.codec.alphabet = "0023456789BCDFGHJKLMNPQRSTVWXY".to_string();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.message.contains("more than once")));
    }

    #[test]
    fn test_validate_odd_tile() {
        let mut config = CodecConfig::default();
        config.codec.tile_width = 3;
        config.codec.tile_height = 3;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.message.contains("even")));
    }

    #[test]
    fn test_validate_tile_must_match_layer_size() {
        let mut config = CodecConfig::default();
        config.codec.tile_width = 16;
        config.codec.tile_height = 16;
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "codec.tile_width");
        assert!(errors[0].message.contains("32x32"), "{}", errors[0].message);
    }

    #[test]
    fn test_validate_palette_budget() {
        let mut config = CodecConfig::default();
        config.codec.palette_size = 16;
        assert!(!config.is_valid());
        config.codec.palette_size = 0;
        assert!(!config.is_valid());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = CodecConfig::default();
        config.codec.max_tiles = 0;
        config.codec.max_name_len = 0;
        assert_eq!(config.validate().len(), 2);
    }
}
