//! Dominant color extraction with a quantized RGB color cube.
//!
//! An image is scanned once into an `N×N×N` histogram ([`ColorCube`]). The
//! cube can then be queried any number of times for its most frequent colors,
//! filtered by luminance class, mutual distinctness and distance from a color
//! to avoid ([`pipeline::select`]). [`SelectionPolicy`] builds a legible
//! background/foreground scheme for a dark or bright theme on top of that.

pub mod cli;
pub mod color;
pub mod error;
pub mod pipeline;
pub mod preview;
pub mod theme;
pub mod tui;

pub use color::Color;
pub use error::{ExtractError, Result};
pub use pipeline::cube::{ColorCube, CubeConfig};
pub use pipeline::policy::{PolicyConfig, Scheme, SelectionPolicy, Theme};
pub use pipeline::select::{SelectionConfig, SelectionFlags};
pub use pipeline::source::{PixelSource, RgbaBuffer};

/// Dominant colors of `image` under `flags`, using the default cube and
/// thresholds. An empty result means no color matched.
pub fn extract_colors<S: PixelSource + ?Sized>(
    image: &S,
    flags: SelectionFlags,
) -> Result<Vec<Color>> {
    let cube = ColorCube::build(image, &CubeConfig::default())?;
    Ok(pipeline::select::select(
        &cube,
        flags,
        None,
        &SelectionConfig::default(),
    ))
}

/// Like [`extract_colors`], but drops colors too close to `avoid`.
pub fn extract_colors_avoiding<S: PixelSource + ?Sized>(
    image: &S,
    flags: SelectionFlags,
    avoid: Color,
) -> Result<Vec<Color>> {
    let cube = ColorCube::build(image, &CubeConfig::default())?;
    Ok(pipeline::select::select(
        &cube,
        flags,
        Some(avoid),
        &SelectionConfig::default(),
    ))
}
