use palette::{LinSrgb, Srgb};

use crate::error::{ExtractError, Result};

/// Largest possible RGB distance, between black and white (sqrt(3 * 255²)).
pub const MAX_DISTANCE: f32 = 441.672_94;

/// Core color type used throughout the pipeline.
/// Wraps sRGB u8 components with an optional alpha channel.
///
/// Equality is exact channel equality. Use [`Color::distance`] for closeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: Option<u8>,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: None }
    }

    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a: Some(a) }
    }

    /// Parse a hex color string like `#ff8800`, `FF8800` or `#f80`.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let srgb: Srgb<u8> = hex.trim().parse().map_err(|_| ExtractError::InvalidColor {
            input: hex.to_string(),
        })?;
        Ok(Self::from(srgb))
    }

    /// Serialize to lowercase hex `#rrggbb`. Alpha is not included.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Perceived brightness `(0.299R + 0.587G + 0.114B) / 255`, in `[0, 1]`.
    ///
    /// This is the measure the dark/bright classification is based on.
    pub fn luminance(self) -> f32 {
        (0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32) / 255.0
    }

    /// Euclidean distance over RGB, in `[0, MAX_DISTANCE]`. Alpha is ignored.
    pub fn distance(self, other: Color) -> f32 {
        let dr = self.r as f32 - other.r as f32;
        let dg = self.g as f32 - other.g as f32;
        let db = self.b as f32 - other.b as f32;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    /// WCAG 2.0 relative luminance of the linearized sRGB channels.
    pub fn relative_luminance(self) -> f32 {
        let linear: LinSrgb = Srgb::<u8>::from(self).into_format::<f32>().into_linear();
        0.2126 * linear.red + 0.7152 * linear.green + 0.0722 * linear.blue
    }

    /// WCAG 2.0 contrast ratio between two colors.
    ///
    /// Returns a value in [1, 21]. Higher means more contrast.
    pub fn contrast_ratio(c1: &Color, c2: &Color) -> f32 {
        let l1 = c1.relative_luminance();
        let l2 = c2.relative_luminance();
        let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
        (lighter + 0.05) / (darker + 0.05)
    }

    /// Black or white, whichever has more contrast against this color.
    pub fn text_color(self) -> Color {
        if Color::contrast_ratio(&self, &Color::BLACK) >= Color::contrast_ratio(&self, &Color::WHITE)
        {
            Color::BLACK
        } else {
            Color::WHITE
        }
    }
}

impl From<Srgb<u8>> for Color {
    fn from(srgb: Srgb<u8>) -> Self {
        Self::new(srgb.red, srgb.green, srgb.blue)
    }
}

impl From<Color> for Srgb<u8> {
    fn from(color: Color) -> Self {
        Srgb::new(color.r, color.g, color.b)
    }
}

impl std::str::FromStr for Color {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let original = Color::from_hex("#ff8800").unwrap();
        assert_eq!(original, Color::new(255, 136, 0));
        assert_eq!(original.to_hex(), "#ff8800");
    }

    #[test]
    fn hex_uppercase_and_bare() {
        assert_eq!(Color::from_hex("FF8800").unwrap().to_hex(), "#ff8800");
        assert_eq!(Color::from_hex("aabbcc").unwrap().to_hex(), "#aabbcc");
    }

    #[test]
    fn hex_short_form() {
        assert_eq!(Color::from_hex("#fff").unwrap(), Color::WHITE);
    }

    #[test]
    fn hex_invalid_input() {
        assert!(Color::from_hex("#ffff").is_err());
        assert!(Color::from_hex("#gggggg").is_err());
        let err = "nope".parse::<Color>().unwrap_err().to_string();
        assert!(err.contains("nope"), "error should name the input: {err}");
    }

    #[test]
    fn equality_includes_alpha() {
        assert_ne!(Color::new(1, 2, 3), Color::with_alpha(1, 2, 3, 255));
        assert_eq!(Color::with_alpha(1, 2, 3, 9), Color::with_alpha(1, 2, 3, 9));
    }

    #[test]
    fn luminance_extremes() {
        assert!(Color::BLACK.luminance().abs() < 1e-6);
        assert!((Color::WHITE.luminance() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn luminance_weights_green_highest() {
        let red = Color::new(255, 0, 0).luminance();
        let green = Color::new(0, 255, 0).luminance();
        let blue = Color::new(0, 0, 255).luminance();
        assert!(green > red && red > blue);
        assert!((red - 0.299).abs() < 1e-4);
    }

    #[test]
    fn distance_black_white_is_max() {
        let d = Color::BLACK.distance(Color::WHITE);
        assert!((d - MAX_DISTANCE).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_ignores_alpha_and_is_symmetric() {
        let a = Color::with_alpha(10, 20, 30, 0);
        let b = Color::new(13, 24, 30);
        assert!((a.distance(b) - 5.0).abs() < 1e-5);
        assert_eq!(a.distance(b), b.distance(a));
    }

    #[test]
    fn contrast_ratio_black_white() {
        let ratio = Color::contrast_ratio(&Color::BLACK, &Color::WHITE);
        assert!(
            (ratio - 21.0).abs() < 0.1,
            "black/white contrast should be ~21:1, got {ratio}"
        );
    }

    #[test]
    fn contrast_ratio_same_color() {
        let gray = Color::new(128, 128, 128);
        let ratio = Color::contrast_ratio(&gray, &gray);
        assert!((ratio - 1.0).abs() < 0.001, "got {ratio}");
    }

    #[test]
    fn text_color_picks_higher_contrast() {
        assert_eq!(Color::WHITE.text_color(), Color::BLACK);
        assert_eq!(Color::new(20, 20, 60).text_color(), Color::WHITE);
        assert_eq!(Color::new(255, 230, 0).text_color(), Color::BLACK);
    }

    #[test]
    fn display_matches_to_hex() {
        let color = Color::new(171, 205, 239);
        assert_eq!(format!("{color}"), color.to_hex());
    }
}
