//! Raster file I/O and preview scaling

use image::imageops::FilterType;
use image::RgbaImage;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for raster file operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Load any supported image file as RGBA.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, OutputError> {
    Ok(image::open(path)?.to_rgba8())
}

/// Save an RGBA image to a PNG file, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image.save(path)?;
    Ok(())
}

/// Scale image by integer factor using nearest-neighbor interpolation.
///
/// Factors of 0 and 1 return the image unchanged.
pub fn scale_image(image: RgbaImage, factor: u8) -> RgbaImage {
    if factor <= 1 {
        return image;
    }
    let (w, h) = image.dimensions();
    image::imageops::resize(&image, w * factor as u32, h * factor as u32, FilterType::Nearest)
}

/// Shrink `image` to fit inside `bounds`, keeping its aspect ratio.
///
/// Images that already fit are returned as is.
pub fn fit_within(image: &RgbaImage, bounds: (u32, u32)) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w <= bounds.0 && h <= bounds.1 {
        return image.clone();
    }

    // Largest size with the same aspect ratio that fits both axes
    let (new_w, new_h) = if w as u64 * bounds.1 as u64 >= h as u64 * bounds.0 as u64 {
        (bounds.0, ((h as u64 * bounds.0 as u64) / w as u64).max(1) as u32)
    } else {
        (((w as u64 * bounds.1 as u64) / h as u64).max(1) as u32, bounds.1)
    };
    image::imageops::resize(image, new_w, new_h, FilterType::Nearest)
}

/// Path for one of several rasters written from a single command.
///
/// | Scenario | Output |
/// |----------|--------|
/// | `-o out.png`, one raster | `out.png` |
/// | `-o out.png`, several | `out_{name}.png` |
/// | `-o dir/` | `dir/{name}.png` |
pub fn output_path(output: &Path, name: &str, is_single: bool) -> PathBuf {
    let is_dir = output.as_os_str().to_string_lossy().ends_with('/') || output.is_dir();

    if is_dir {
        output.join(format!("{}.png", name))
    } else if is_single {
        output.to_path_buf()
    } else {
        let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("design");
        let parent = output.parent().unwrap_or(Path::new(""));
        if parent.as_os_str().is_empty() {
            PathBuf::from(format!("{}_{}.png", stem, name))
        } else {
            parent.join(format!("{}_{}.png", stem, name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_output_path_single() {
        assert_eq!(output_path(Path::new("out.png"), "0", true), PathBuf::from("out.png"));
    }

    #[test]
    fn test_output_path_multiple() {
        assert_eq!(
            output_path(Path::new("build/shirt.png"), "front", false),
            PathBuf::from("build/shirt_front.png")
        );
        assert_eq!(output_path(Path::new("shirt.png"), "back", false), PathBuf::from("shirt_back.png"));
    }

    #[test]
    fn test_output_path_directory() {
        assert_eq!(output_path(Path::new("tiles/"), "3", false), PathBuf::from("tiles/3.png"));
    }

    #[test]
    fn test_save_and_load_png() {
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/layer.png");

        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 1, Rgba([0, 0, 0, 0]));

        save_png(&image, &path).unwrap();
        let loaded = load_rgba(&path).unwrap();
        assert_eq!(loaded, image);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_rgba(Path::new("/nonexistent/design.png"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scale_image_factor_two() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, Rgba([0, 255, 0, 255]));

        let scaled = scale_image(image, 2);
        assert_eq!(scaled.dimensions(), (4, 2));
        assert_eq!(*scaled.get_pixel(1, 1), Rgba([255, 0, 0, 255]));
        assert_eq!(*scaled.get_pixel(2, 0), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_scale_image_factor_one_returns_original() {
        let image = RgbaImage::new(3, 3);
        assert_eq!(scale_image(image, 1).dimensions(), (3, 3));
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        let wide = RgbaImage::new(64, 16);
        assert_eq!(fit_within(&wide, (32, 32)).dimensions(), (32, 8));

        let tall = RgbaImage::new(20, 100);
        assert_eq!(fit_within(&tall, (32, 32)).dimensions(), (6, 32));

        let small = RgbaImage::new(10, 10);
        assert_eq!(fit_within(&small, (32, 32)).dimensions(), (10, 10));
    }
}
