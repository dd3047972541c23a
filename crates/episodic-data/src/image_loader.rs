// ImageLoader — decode an image file into a fixed-size grayscale grid
//
// The episode dataset only needs "load the image at this path and give me a
// fixed-size pixel grid". `ImageLoader` is that seam; `GrayscaleLoader` is the
// implementation backed by the `image` crate:
//
//   open → convert to single channel (Luma8) → resize to W×H with Lanczos3
//        → scale to [0, 1] floats in [1, H, W] layout
//
// The file handle lives only for the duration of `load`.

use std::path::Path;

use image::imageops::FilterType;

use episodic_core::{Error, Result};

/// Supported image extensions (case-insensitive).
const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];

/// Whether `path` has a recognised image extension.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Decodes a file into pixel values in `[C, H, W]` layout.
pub trait ImageLoader: Send + Sync {
    /// Load and decode `path`.
    fn load(&self, path: &Path) -> Result<Vec<f64>>;

    /// The `[C, H, W]` shape every call to [`load`](ImageLoader::load) returns.
    fn output_shape(&self) -> [usize; 3];
}

/// Single-channel loader resizing every image to a fixed square (or rectangle).
#[derive(Debug, Clone, Copy)]
pub struct GrayscaleLoader {
    width: u32,
    height: u32,
    filter: FilterType,
}

/// Side length of the glyph images the episode pipeline works with.
pub const DEFAULT_IMAGE_SIZE: u32 = 28;

impl Default for GrayscaleLoader {
    fn default() -> Self {
        Self::square(DEFAULT_IMAGE_SIZE)
    }
}

impl GrayscaleLoader {
    /// Resize to `size × size` with Lanczos3.
    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }

    /// Resize to `width × height` with Lanczos3.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            filter: FilterType::Lanczos3,
        }
    }

    /// Use a different resampling filter.
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

impl ImageLoader for GrayscaleLoader {
    fn load(&self, path: &Path) -> Result<Vec<f64>> {
        let img = image::open(path).map_err(|e| Error::Decode {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        // Convert first, then resize, so the filter runs on the single channel.
        let gray = img.to_luma8();
        let gray = if gray.dimensions() == (self.width, self.height) {
            gray
        } else {
            image::imageops::resize(&gray, self.width, self.height, self.filter)
        };

        Ok(gray.as_raw().iter().map(|&v| v as f64 / 255.0).collect())
    }

    fn output_shape(&self) -> [usize; 3] {
        [1, self.height as usize, self.width as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn extension_filter() {
        assert!(is_image(Path::new("a/b/0709_01.png")));
        assert!(is_image(Path::new("a/b/scan.JPG")));
        assert!(!is_image(Path::new("a/b/.DS_Store")));
        assert!(!is_image(Path::new("a/b/notes.txt")));
        assert!(!is_image(Path::new("a/b/noext")));
    }

    #[test]
    fn loads_and_resizes_to_fixed_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glyph.png");
        GrayImage::from_pixel(105, 105, Luma([255u8]))
            .save(&path)
            .unwrap();

        let loader = GrayscaleLoader::square(28);
        let pixels = loader.load(&path).unwrap();
        assert_eq!(loader.output_shape(), [1, 28, 28]);
        assert_eq!(pixels.len(), 28 * 28);
        assert!(pixels.iter().all(|&v| v > 0.98 && v <= 1.0));
    }

    #[test]
    fn colour_input_becomes_single_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colour.png");
        RgbImage::from_pixel(4, 4, Rgb([0u8, 0, 0])).save(&path).unwrap();

        let pixels = GrayscaleLoader::new(4, 4).load(&path).unwrap();
        assert_eq!(pixels.len(), 16);
        assert!(pixels.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn undecodable_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let err = GrayscaleLoader::default().load(&path).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
