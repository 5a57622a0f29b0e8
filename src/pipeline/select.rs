use std::cmp::Ordering;
use std::ops::{BitOr, BitOrAssign};

use log::{trace, warn};

use crate::color::Color;
use crate::error::{ExtractError, Result};
use crate::pipeline::cube::{ColorCube, PaletteEntry};

pub const DEFAULT_DARK_THRESHOLD: f32 = 0.5;
pub const DEFAULT_AVOID_DISTANCE: f32 = 60.0;
pub const DEFAULT_DISTINCT_DISTANCE: f32 = 40.0;

/// A set of independent selection constraints, combinable with `|`.
///
/// `ONLY_DARK` and `ONLY_BRIGHT` are mutually exclusive: asking for both is a
/// caller error and behaves as if neither was set. The same holds for the two
/// ordering flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SelectionFlags(u8);

impl SelectionFlags {
    pub const NONE: Self = Self(0);
    /// Keep colors at or above the dark threshold.
    pub const ONLY_BRIGHT: Self = Self(1 << 0);
    /// Keep colors below the dark threshold.
    pub const ONLY_DARK: Self = Self(1 << 1);
    /// Keep only colors pairwise separated by the distinctness threshold.
    pub const ONLY_DISTINCT: Self = Self(1 << 2);
    /// Brightest first instead of most frequent first.
    pub const ORDER_BY_BRIGHTNESS: Self = Self(1 << 3);
    /// Darkest first instead of most frequent first.
    pub const ORDER_BY_DARKNESS: Self = Self(1 << 4);
    /// Drop colors too close to white.
    pub const AVOID_WHITE: Self = Self(1 << 5);
    /// Drop colors too close to black.
    pub const AVOID_BLACK: Self = Self(1 << 6);
    /// Only consider buckets that are local density maxima of the cube.
    pub const ONLY_LOCAL_MAXIMA: Self = Self(1 << 7);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The flag for a name as used on the command line.
    pub fn from_name(name: &str) -> Result<Self> {
        let flag = match name.trim().to_ascii_lowercase().as_str() {
            "dark" | "only-dark" => Self::ONLY_DARK,
            "bright" | "only-bright" => Self::ONLY_BRIGHT,
            "distinct" | "only-distinct" => Self::ONLY_DISTINCT,
            "order-brightness" => Self::ORDER_BY_BRIGHTNESS,
            "order-darkness" => Self::ORDER_BY_DARKNESS,
            "avoid-white" => Self::AVOID_WHITE,
            "avoid-black" => Self::AVOID_BLACK,
            "local-maxima" => Self::ONLY_LOCAL_MAXIMA,
            other => {
                return Err(ExtractError::invalid_config(format!(
                    "unknown selection flag {other:?}"
                )))
            }
        };
        Ok(flag)
    }
}

impl BitOr for SelectionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for SelectionFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl std::str::FromStr for SelectionFlags {
    type Err = ExtractError;

    /// Parse a comma separated list such as `dark,distinct`.
    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .try_fold(Self::NONE, |acc, part| Ok(acc | Self::from_name(part)?))
    }
}

/// Thresholds used by the selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    /// Luminance below this is dark, at or above is bright.
    pub dark_threshold: f32,
    /// Candidates closer than this to the avoid color are dropped.
    pub avoid_distance: f32,
    /// Minimum pairwise distance under `ONLY_DISTINCT`.
    pub distinct_distance: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            dark_threshold: DEFAULT_DARK_THRESHOLD,
            avoid_distance: DEFAULT_AVOID_DISTANCE,
            distinct_distance: DEFAULT_DISTINCT_DISTANCE,
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.dark_threshold) {
            return Err(ExtractError::invalid_config(format!(
                "dark threshold must be within [0, 1], got {}",
                self.dark_threshold
            )));
        }
        for (name, value) in [
            ("avoid distance", self.avoid_distance),
            ("distinct distance", self.distinct_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ExtractError::invalid_config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Rank the cube's buckets under `flags`, keeping the per-entry metadata.
///
/// Candidates pass the luminance filter, then the avoid filters, are sorted
/// by population (ties: darker first, then bucket index), thinned to a
/// distinct set if requested and finally reordered by brightness if
/// requested. An empty result is a normal outcome.
pub fn rank(
    cube: &ColorCube,
    flags: SelectionFlags,
    avoid: Option<Color>,
    config: &SelectionConfig,
) -> Vec<PaletteEntry> {
    let mut entries = if flags.contains(SelectionFlags::ONLY_LOCAL_MAXIMA) {
        cube.local_maxima()
    } else {
        cube.entries()
    };
    trace!("{} candidates for {flags:?}", entries.len());

    match luminance_class(flags) {
        Some(LuminanceClass::Dark) => entries.retain(|e| e.luminance < config.dark_threshold),
        Some(LuminanceClass::Bright) => entries.retain(|e| e.luminance >= config.dark_threshold),
        None => {}
    }

    let mut excluded: Vec<Color> = avoid.into_iter().collect();
    if flags.contains(SelectionFlags::AVOID_WHITE) {
        excluded.push(Color::WHITE);
    }
    if flags.contains(SelectionFlags::AVOID_BLACK) {
        excluded.push(Color::BLACK);
    }
    entries.retain(|e| {
        excluded
            .iter()
            .all(|&x| e.color.distance(x) >= config.avoid_distance)
    });
    trace!("{} candidates after luminance and avoid filters", entries.len());

    entries.sort_by(by_population);

    if flags.contains(SelectionFlags::ONLY_DISTINCT) {
        entries = distinct(entries, config.distinct_distance);
        trace!("{} distinct candidates", entries.len());
    }

    let by_brightness = flags.contains(SelectionFlags::ORDER_BY_BRIGHTNESS);
    let by_darkness = flags.contains(SelectionFlags::ORDER_BY_DARKNESS);
    match (by_brightness, by_darkness) {
        (true, true) => {
            warn!("both brightness and darkness ordering requested; keeping frequency order")
        }
        (true, false) => entries.sort_by(|a, b| b.luminance.total_cmp(&a.luminance)),
        (false, true) => entries.sort_by(|a, b| a.luminance.total_cmp(&b.luminance)),
        (false, false) => {}
    }

    entries
}

/// Dominant colors of the cube under `flags`, most relevant first.
pub fn select(
    cube: &ColorCube,
    flags: SelectionFlags,
    avoid: Option<Color>,
    config: &SelectionConfig,
) -> Vec<Color> {
    rank(cube, flags, avoid, config)
        .into_iter()
        .map(|e| e.color)
        .collect()
}

/// Like [`select`], but returns at most `count` colors.
pub fn select_count(
    cube: &ColorCube,
    flags: SelectionFlags,
    avoid: Option<Color>,
    config: &SelectionConfig,
    count: usize,
) -> Vec<Color> {
    let mut colors = select(cube, flags, avoid, config);
    colors.truncate(count);
    colors
}

/// Up to `count` distinct bright colors, avoiding `avoid` if given.
pub fn bright_colors(
    cube: &ColorCube,
    avoid: Option<Color>,
    config: &SelectionConfig,
    count: usize,
) -> Vec<Color> {
    let flags = SelectionFlags::ONLY_BRIGHT | SelectionFlags::ONLY_DISTINCT;
    select_count(cube, flags, avoid, config, count)
}

/// Up to `count` distinct dark colors, avoiding `avoid` if given.
pub fn dark_colors(
    cube: &ColorCube,
    avoid: Option<Color>,
    config: &SelectionConfig,
    count: usize,
) -> Vec<Color> {
    let flags = SelectionFlags::ONLY_DARK | SelectionFlags::ONLY_DISTINCT;
    select_count(cube, flags, avoid, config, count)
}

enum LuminanceClass {
    Dark,
    Bright,
}

fn luminance_class(flags: SelectionFlags) -> Option<LuminanceClass> {
    match (
        flags.contains(SelectionFlags::ONLY_DARK),
        flags.contains(SelectionFlags::ONLY_BRIGHT),
    ) {
        (true, true) => {
            warn!("both dark and bright colors requested; ignoring the luminance filter");
            None
        }
        (true, false) => Some(LuminanceClass::Dark),
        (false, true) => Some(LuminanceClass::Bright),
        (false, false) => None,
    }
}

fn by_population(a: &PaletteEntry, b: &PaletteEntry) -> Ordering {
    b.population
        .cmp(&a.population)
        .then_with(|| a.luminance.total_cmp(&b.luminance))
        .then_with(|| a.index.cmp(&b.index))
}

/// Greedy pass keeping entries at least `threshold` away from every kept one.
fn distinct(entries: Vec<PaletteEntry>, threshold: f32) -> Vec<PaletteEntry> {
    let mut kept: Vec<PaletteEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if kept
            .iter()
            .all(|k| k.color.distance(entry.color) >= threshold)
        {
            kept.push(entry);
        }
    }
    kept
}
