use ratatui::prelude::*;
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::color::Color as AppColor;
use crate::pipeline::policy::Scheme;

fn to_color(c: &AppColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// The scheme's background filling the whole area, with one "Color n" label
/// per foreground color drawn in that color.
pub struct SchemeWidget<'a> {
    scheme: &'a Scheme,
}

impl<'a> SchemeWidget<'a> {
    pub fn new(scheme: &'a Scheme) -> Self {
        Self { scheme }
    }
}

fn build_label(index: usize, color: &AppColor, background: &AppColor) -> Line<'static> {
    let ratio = AppColor::contrast_ratio(color, background);
    Line::from(vec![
        Span::styled(
            format!("  Color {}", index + 1),
            Style::default()
                .fg(to_color(color))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}  {ratio:.1}:1", color.to_hex()),
            Style::default().fg(to_color(color)),
        ),
    ])
}

impl Widget for SchemeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scheme = self.scheme;
        let bg = to_color(&scheme.background);
        let muted = Style::default().fg(to_color(&scheme.background.text_color()));

        let title = format!(
            " {} background {}{} ",
            scheme.theme,
            scheme.background.to_hex(),
            if scheme.background_defaulted {
                " (default)"
            } else {
                ""
            }
        );
        let block = Block::bordered()
            .title(title)
            .style(Style::default().bg(bg))
            .border_style(muted);
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines = vec![Line::from("")];
        if scheme.foreground.is_empty() {
            lines.push(Line::styled("  (no legible colors in this image)", muted));
        }
        for (i, color) in scheme.foreground.iter().enumerate() {
            lines.push(build_label(i, color, &scheme.background));
        }
        if scheme.retried {
            lines.push(Line::from(""));
            lines.push(Line::styled("  fell back to distinct colors", muted));
        }

        Paragraph::new(lines)
            .style(Style::default().bg(bg))
            .render(inner, buf);
    }
}
