use std::path::Path;

use image::imageops::FilterType;
use image::{ImageBuffer, RgbImage, RgbaImage};

use crate::error::{ExtractError, Result};

/// Read-only view over a decoded image.
///
/// Implementations must be cheap to read concurrently: the cube may scan
/// disjoint row ranges from several threads.
pub trait PixelSource: Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// RGBA of the pixel at `(x, y)`. Callers stay within `width × height`.
    fn pixel(&self, x: u32, y: u32) -> [u8; 4];

    /// Reject sources that cannot be scanned.
    fn validate(&self) -> Result<()> {
        if self.width() == 0 || self.height() == 0 {
            return Err(ExtractError::invalid_image(format!(
                "zero dimension: {}x{}",
                self.width(),
                self.height()
            )));
        }
        Ok(())
    }
}

/// An owned, tightly packed RGBA8 buffer.
#[derive(Debug, Clone)]
pub struct RgbaBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// Byte length of a `width` x `height` RGBA8 buffer, `None` when it does
/// not fit in memory.
fn byte_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(4))
}

impl RgbaBuffer {
    /// Wrap `data` (4 bytes per pixel, row-major). Fails when the length does
    /// not match the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height).ok_or_else(|| {
            ExtractError::invalid_image(format!("{width}x{height} RGBA buffer is too large"))
        })?;
        if data.len() != expected {
            return Err(ExtractError::invalid_image(format!(
                "buffer length {} does not match {width}x{height} RGBA ({expected} bytes)",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build an opaque buffer from RGB triples.
    pub fn from_rgb(width: u32, height: u32, pixels: &[[u8; 3]]) -> Result<Self> {
        let data = pixels
            .iter()
            .flat_map(|&[r, g, b]| [r, g, b, 255])
            .collect();
        Self::new(width, height, data)
    }

    /// Build a buffer by evaluating `f` for every pixel.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> [u8; 4],
    ) -> Result<Self> {
        let len = byte_len(width, height).ok_or_else(|| {
            ExtractError::invalid_image(format!("{width}x{height} RGBA buffer is too large"))
        })?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

impl PixelSource for RgbaBuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

impl PixelSource for RgbaImage {
    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.get_pixel(x, y).0
    }
}

impl PixelSource for RgbImage {
    fn width(&self) -> u32 {
        ImageBuffer::width(self)
    }

    fn height(&self) -> u32 {
        ImageBuffer::height(self)
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let [r, g, b] = self.get_pixel(x, y).0;
        [r, g, b, 255]
    }
}

/// Decode an image file into an RGBA pixel source.
///
/// When `max_dim` is set and the image exceeds it in either direction, the
/// image is scaled down to fit (aspect ratio preserved).
pub fn load_image(path: &Path, max_dim: Option<u32>) -> Result<RgbaImage> {
    let img = image::open(path).map_err(|source| {
        let message = if !path.exists() {
            "file not found".to_string()
        } else {
            "unsupported or corrupt image (supported: PNG, JPEG, WebP, BMP, TIFF, GIF)".to_string()
        };
        ExtractError::Decode {
            path: path.to_path_buf(),
            message,
            source,
        }
    })?;

    let img = match max_dim {
        Some(max) if max > 0 && (img.width() > max || img.height() > max) => {
            log::debug!(
                "downscaling {} from {}x{} to fit {max}",
                path.display(),
                img.width(),
                img.height()
            );
            img.resize(max, max, FilterType::Triangle)
        }
        _ => img,
    };

    Ok(img.to_rgba8())
}
