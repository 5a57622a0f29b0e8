pub mod cube;
pub mod policy;
pub mod select;
pub mod source;
pub mod worker;

use std::path::Path;

use crate::error::Result;

use cube::{ColorCube, CubeConfig};
use policy::{PolicyConfig, Scheme, SelectionPolicy, Theme};

pub const DEFAULT_MAX_DIM: u32 = 256;

/// Everything one extraction needs besides the image and the theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractSettings {
    pub cube: CubeConfig,
    pub policy: PolicyConfig,
    /// Downscale decoded images to fit this size. `None` keeps full size.
    pub max_dim: Option<u32>,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            cube: CubeConfig::default(),
            policy: PolicyConfig::default(),
            max_dim: Some(DEFAULT_MAX_DIM),
        }
    }
}

impl ExtractSettings {
    pub fn validate(&self) -> Result<()> {
        self.cube.validate()?;
        self.policy.selection.validate()
    }
}

/// Decode `path`, build its cube and run the theme cascade.
pub fn extract_scheme(path: &Path, theme: Theme, settings: &ExtractSettings) -> Result<Scheme> {
    settings.validate()?;
    let image = source::load_image(path, settings.max_dim)?;
    let cube = ColorCube::build(&image, &settings.cube)?;
    Ok(SelectionPolicy::new(settings.policy).run(&cube, theme))
}
