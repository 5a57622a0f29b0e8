use std::path::PathBuf;

use thiserror::Error;

/// Result alias used by the extraction library.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Hard failures of an extraction call.
///
/// An empty palette is never an error; only malformed input ends up here.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The pixel source has zero dimensions or an unreadable buffer.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The image file could not be opened or decoded.
    #[error("{message}: {}", .path.display())]
    Decode {
        path: PathBuf,
        message: String,
        #[source]
        source: image::ImageError,
    },

    /// A tuning parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A color string could not be parsed.
    #[error("invalid color {input:?}: expected #rrggbb or #rgb")]
    InvalidColor { input: String },
}

impl ExtractError {
    pub(crate) fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
