use std::path::Path;

use anyhow::{Context, Result};

use crate::pipeline::policy::Scheme;

/// A selected color scheme in a plain `key = value` text format.
#[derive(Debug, Clone)]
pub struct ThemeFile {
    pub scheme: Scheme,
}

impl ThemeFile {
    pub fn from_scheme(scheme: Scheme) -> Self {
        Self { scheme }
    }

    /// Serialize as one `key = value` pair per line: the theme, the
    /// background, then `foreground-N` for each foreground color.
    pub fn serialize(&self) -> String {
        let scheme = &self.scheme;
        let mut out = String::new();
        out.push_str(&format!("theme = {}\n", scheme.theme));
        out.push_str(&format!("background = {}\n", scheme.background.to_hex()));
        for (i, color) in scheme.foreground.iter().enumerate() {
            out.push_str(&format!("foreground-{} = {}\n", i + 1, color.to_hex()));
        }
        out
    }

    /// Write the theme to an arbitrary path.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.serialize())
            .with_context(|| format!("failed to write theme to {}", path.display()))
    }
}
