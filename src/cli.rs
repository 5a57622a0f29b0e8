use std::path::PathBuf;

use clap::Parser;

use crate::color::Color;
use crate::error::Result;
use crate::pipeline::cube::{CubeConfig, DEFAULT_RESOLUTION};
use crate::pipeline::policy::{PolicyConfig, Theme, DEFAULT_MIN_FOREGROUND};
use crate::pipeline::select::{
    SelectionConfig, SelectionFlags, DEFAULT_AVOID_DISTANCE, DEFAULT_DARK_THRESHOLD,
    DEFAULT_DISTINCT_DISTANCE,
};
use crate::pipeline::{ExtractSettings, DEFAULT_MAX_DIM};

/// Extract dominant colors from images and pick legible color schemes.
#[derive(Parser, Debug)]
#[command(name = "colorcube", version, about)]
pub struct Args {
    /// Input images
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Background theme to build a scheme for
    #[arg(short, long, value_enum, default_value_t = ThemeMode::Dark)]
    pub mode: ThemeMode,

    /// Print raw selector output for these flags instead of a scheme
    /// (comma separated: dark, bright, distinct, order-brightness,
    /// order-darkness, avoid-white, avoid-black, local-maxima)
    #[arg(short, long)]
    pub flags: Option<String>,

    /// Exclude colors close to this one (hex) when printing raw selector output
    #[arg(long, requires = "flags")]
    pub avoid: Option<String>,

    /// Maximum number of colors printed with --flags
    #[arg(short = 'c', long = "colors", requires = "flags")]
    pub colors: Option<usize>,

    /// Quantization levels per channel
    #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
    pub resolution: usize,

    /// Sample every Nth pixel in both directions
    #[arg(long, default_value_t = 1)]
    pub stride: u32,

    /// Downscale images to fit this size before scanning (0 disables)
    #[arg(long, default_value_t = DEFAULT_MAX_DIM)]
    pub max_dim: u32,

    /// Luminance below this counts as dark
    #[arg(long, default_value_t = DEFAULT_DARK_THRESHOLD)]
    pub dark_threshold: f32,

    /// Minimum RGB distance from the avoided color
    #[arg(long, default_value_t = DEFAULT_AVOID_DISTANCE)]
    pub avoid_distance: f32,

    /// Minimum RGB distance between distinct colors
    #[arg(long, default_value_t = DEFAULT_DISTINCT_DISTANCE)]
    pub distinct_distance: f32,

    /// Foreground colors wanted before falling back to distinct colors
    #[arg(long, default_value_t = DEFAULT_MIN_FOREGROUND)]
    pub min_foreground: usize,

    /// Write the scheme to this file instead of stdout
    #[arg(short, long, conflicts_with_all = ["tui", "flags"])]
    pub output: Option<PathBuf>,

    /// Print a colored terminal preview of the scheme
    #[arg(long, conflicts_with = "flags")]
    pub preview: bool,

    /// Launch interactive TUI mode
    #[arg(long, conflicts_with = "flags")]
    pub tui: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ThemeMode {
    Dark,
    #[value(alias = "light")]
    Bright,
}

impl From<ThemeMode> for Theme {
    fn from(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Theme::Dark,
            ThemeMode::Bright => Theme::Bright,
        }
    }
}

impl Args {
    /// Extraction settings assembled from the tuning flags.
    pub fn settings(&self) -> Result<ExtractSettings> {
        let settings = ExtractSettings {
            cube: CubeConfig {
                resolution: self.resolution,
                stride: self.stride,
            },
            policy: PolicyConfig {
                selection: SelectionConfig {
                    dark_threshold: self.dark_threshold,
                    avoid_distance: self.avoid_distance,
                    distinct_distance: self.distinct_distance,
                },
                min_foreground: self.min_foreground,
            },
            max_dim: (self.max_dim > 0).then_some(self.max_dim),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parsed `--flags`, if raw selector output was requested.
    pub fn selection_flags(&self) -> Result<Option<SelectionFlags>> {
        self.flags.as_deref().map(str::parse).transpose()
    }

    pub fn avoid_color(&self) -> Result<Option<Color>> {
        self.avoid.as_deref().map(Color::from_hex).transpose()
    }
}
