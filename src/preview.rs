use std::io::Write;

use anyhow::Result;
use crossterm::queue;
use crossterm::style::{Color as TermColor, Print, ResetColor, SetBackgroundColor, SetForegroundColor};

use crate::color::Color;
use crate::pipeline::policy::Scheme;

const WIDTH: usize = 40;

fn to_term(c: Color) -> TermColor {
    TermColor::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Print the scheme as a block of background color with one "Color n"
/// label per foreground color, followed by its hex and contrast ratio.
pub fn render<W: Write>(out: &mut W, scheme: &Scheme) -> Result<()> {
    let bg = to_term(scheme.background);
    let blank = " ".repeat(WIDTH);

    queue!(out, SetBackgroundColor(bg), Print(&blank), ResetColor, Print("\n"))?;
    if scheme.foreground.is_empty() {
        let text = format!("{:<WIDTH$}", "  (no legible colors)");
        queue!(
            out,
            SetBackgroundColor(bg),
            SetForegroundColor(to_term(scheme.background.text_color())),
            Print(text),
            ResetColor,
            Print("\n")
        )?;
    }
    for (i, color) in scheme.foreground.iter().enumerate() {
        let ratio = Color::contrast_ratio(color, &scheme.background);
        let text = format!("  Color {:<3} {}  {:>5.2}:1", i + 1, color.to_hex(), ratio);
        queue!(
            out,
            SetBackgroundColor(bg),
            SetForegroundColor(to_term(*color)),
            Print(format!("{text:<WIDTH$}")),
            ResetColor,
            Print("\n")
        )?;
    }
    queue!(out, SetBackgroundColor(bg), Print(&blank), ResetColor, Print("\n"))?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::policy::Theme;

    fn scheme(foreground: Vec<Color>) -> Scheme {
        Scheme {
            theme: Theme::Dark,
            background: Color::BLACK,
            foreground,
            background_defaulted: true,
            retried: false,
            steps: Vec::new(),
        }
    }

    #[test]
    fn labels_every_foreground_color() {
        let mut out = Vec::new();
        render(&mut out, &scheme(vec![Color::WHITE, Color::new(255, 0, 0)])).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Color 1"));
        assert!(text.contains("Color 2"));
        assert!(text.contains("#ff0000"));
        assert!(text.contains("21.00:1"));
    }

    #[test]
    fn empty_foreground_still_renders() {
        let mut out = Vec::new();
        render(&mut out, &scheme(Vec::new())).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("no legible colors"));
    }
}
