use log::debug;

use crate::color::Color;
use crate::error::{ExtractError, Result};
use crate::pipeline::cube::ColorCube;
use crate::pipeline::select::{select, SelectionConfig, SelectionFlags};

pub const DEFAULT_MIN_FOREGROUND: usize = 2;

/// Whether the scheme is built around a dark or a bright background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Dark,
    Bright,
}

impl Theme {
    /// Luminance flag matching the background of this theme.
    pub fn background_flag(self) -> SelectionFlags {
        match self {
            Theme::Dark => SelectionFlags::ONLY_DARK,
            Theme::Bright => SelectionFlags::ONLY_BRIGHT,
        }
    }

    /// Luminance flag for text drawn on this theme's background.
    pub fn foreground_flag(self) -> SelectionFlags {
        self.toggled().background_flag()
    }

    /// Background used when the image has no color of the right class.
    pub fn default_background(self) -> Color {
        match self {
            Theme::Dark => Color::BLACK,
            Theme::Bright => Color::WHITE,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Bright,
            Theme::Bright => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Bright => "bright",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "bright" | "light" => Ok(Theme::Bright),
            other => Err(ExtractError::invalid_config(format!(
                "unknown theme {other:?}, expected dark or bright"
            ))),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyConfig {
    pub selection: SelectionConfig,
    /// Fewer foreground colors than this triggers the distinct-color retry.
    pub min_foreground: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            min_foreground: DEFAULT_MIN_FOREGROUND,
        }
    }
}

/// States the cascade moves through, in the order they were visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyStep {
    SelectBackground,
    SelectForeground,
    Retry,
    Done,
}

/// Background plus foreground colors legible against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheme {
    pub theme: Theme,
    pub background: Color,
    /// Most dominant first. May be empty.
    pub foreground: Vec<Color>,
    /// The background is the theme's canonical default, not an image color.
    pub background_defaulted: bool,
    /// The distinct-color retry ran.
    pub retried: bool,
    pub steps: Vec<PolicyStep>,
}

/// Picks a background and foreground for a theme with bounded fallback.
///
/// 1. Background: most dominant color of the theme's luminance class, or
///    black/white when there is none.
/// 2. Foreground: colors of the opposite class away from the background.
/// 3. Retry: when that yields fewer than `min_foreground` colors, query once
///    more for distinct colors of any luminance away from the background and
///    keep whatever comes back, even nothing.
#[derive(Debug, Clone, Default)]
pub struct SelectionPolicy {
    config: PolicyConfig,
}

impl SelectionPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn run(&self, cube: &ColorCube, theme: Theme) -> Scheme {
        let selection = &self.config.selection;
        let mut scheme = Scheme {
            theme,
            background: theme.default_background(),
            foreground: Vec::new(),
            background_defaulted: false,
            retried: false,
            steps: Vec::with_capacity(4),
        };

        let mut step = PolicyStep::SelectBackground;
        loop {
            scheme.steps.push(step);
            step = match step {
                PolicyStep::SelectBackground => {
                    match select(cube, theme.background_flag(), None, selection).first() {
                        Some(&color) => scheme.background = color,
                        None => scheme.background_defaulted = true,
                    }
                    PolicyStep::SelectForeground
                }
                PolicyStep::SelectForeground => {
                    scheme.foreground = select(
                        cube,
                        theme.foreground_flag(),
                        Some(scheme.background),
                        selection,
                    );
                    if scheme.foreground.len() < self.config.min_foreground {
                        PolicyStep::Retry
                    } else {
                        PolicyStep::Done
                    }
                }
                PolicyStep::Retry => {
                    scheme.retried = true;
                    scheme.foreground = select(
                        cube,
                        SelectionFlags::ONLY_DISTINCT,
                        Some(scheme.background),
                        selection,
                    );
                    PolicyStep::Done
                }
                PolicyStep::Done => break,
            };
        }

        debug!(
            "{theme} scheme: background {}{}, {} foreground colors{}",
            scheme.background,
            if scheme.background_defaulted { " (default)" } else { "" },
            scheme.foreground.len(),
            if scheme.retried { " after retry" } else { "" }
        );
        scheme
    }
}
