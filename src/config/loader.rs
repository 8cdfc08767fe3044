//! Configuration loading and discovery for `design.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::{CodecConfig, ColorSpace};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for during discovery
pub const CONFIG_FILE_NAME: &str = "design.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse design.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the tile budget
    pub max_tiles: Option<usize>,
    /// Override the quantizer color space
    pub color_space: Option<ColorSpace>,
}

/// Find design.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for design.toml
/// 2. Check XDG_CONFIG_HOME/design-codec/design.toml (or ~/.config/design-codec/design.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find design.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("design-codec").join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find design.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a design.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the built-in
/// defaults.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let codes = CodeIdentity::new(&config);
/// ```
pub fn load_config(path: Option<&Path>) -> Result<CodecConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => {
            log::debug!("Loading config from {}", p.display());
            load_config_file(&p)
        }
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path) -> Result<CodecConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate configuration text.
pub fn parse_config(contents: &str) -> Result<CodecConfig, ConfigError> {
    let config: CodecConfig = toml::from_str(contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Built-in configuration used when no design.toml is found.
pub fn default_config() -> CodecConfig {
    CodecConfig::default()
}

/// Merge CLI overrides into a configuration, re-validating the result.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(
    config: &mut CodecConfig,
    overrides: &CliOverrides,
) -> Result<(), ConfigError> {
    if let Some(max_tiles) = overrides.max_tiles {
        config.codec.max_tiles = max_tiles;
    }

    if let Some(color_space) = overrides.color_space {
        config.quantize.color_space = color_space;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_current_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).expect("should create config file");

        let found = find_config_from(temp.path().to_path_buf());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_parent_dir() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        File::create(&config_path).expect("should create config file");

        let nested = temp.path().join("uploads").join("batch");
        fs::create_dir_all(&nested).expect("should create nested dirs");

        let found = find_config_from(nested);
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        let found = find_config_from(temp.path().to_path_buf());
        assert!(found.is_none());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(
                br#"
[codec]
max_tiles = 8
max_name_len = 32

[quantize]
color_space = "rgb"
"#,
            )
            .expect("should write config content");

        let config = load_config(Some(&config_path)).expect("should load valid config");
        assert_eq!(config.codec.max_tiles, 8);
        assert_eq!(config.codec.max_name_len, 32);
        assert_eq!(config.codec.tile_width, 32);
        assert_eq!(config.quantize.color_space, ColorSpace::Rgb);
    }

    #[test]
    fn test_load_config_missing_file_errors() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join("nonexistent.toml");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let temp = TempDir::new().expect("should create temp dir");
        let config_path = temp.path().join(CONFIG_FILE_NAME);
        File::create(&config_path)
            .expect("should create config file")
            .write_all(b"this is not valid toml {{{")
            .expect("should write invalid config");

        let result = load_config(Some(&config_path));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_validation_error() {
        let result = parse_config("[codec]\npalette_size = 40\n");
        match result {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("codec.palette_size"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_config_rejects_other_tile_size() {
        let result = parse_config("[codec]\ntile_width = 16\ntile_height = 16\n");
        match result {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("codec.tile_width"));
                assert!(errors[0].contains("16x16"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_find_xdg_config() {
        let temp = TempDir::new().expect("should create temp dir");
        let dir = temp.path().join("design-codec");
        fs::create_dir_all(&dir).expect("should create xdg dir");
        let config_path = dir.join(CONFIG_FILE_NAME);
        File::create(&config_path).expect("should create config file");

        let previous = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", temp.path());
        let found = find_xdg_config();
        match previous {
            Some(v) => env::set_var("XDG_CONFIG_HOME", v),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }

        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut config = default_config();
        let overrides = CliOverrides {
            max_tiles: Some(4),
            color_space: Some(ColorSpace::Rgb),
        };
        merge_cli_overrides(&mut config, &overrides).expect("overrides should be valid");
        assert_eq!(config.codec.max_tiles, 4);
        assert_eq!(config.quantize.color_space, ColorSpace::Rgb);
    }

    #[test]
    fn test_merge_cli_overrides_rejects_invalid() {
        let mut config = default_config();
        let overrides = CliOverrides { max_tiles: Some(0), ..Default::default() };
        let result = merge_cli_overrides(&mut config, &overrides);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
