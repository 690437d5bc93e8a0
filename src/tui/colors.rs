//! Styles for the terminal user interface, built from the configured color scheme.

use std::str::FromStr;

use ratatui::style::{Color, Style};

use crate::config::{ColorPair, ColorScheme};

/// Resolved styles for each screen region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub header: Style,
    pub footer: Style,
    pub selected: Style,
    pub normal: Style,
    pub highlight: Style,
}

/// Parse a color name (`blue`, `lightred`, `#ff8800`, `reset`, ...).
/// Unknown names fall back to the terminal default.
pub fn parse_color(name: &str) -> Color {
    Color::from_str(name.trim()).unwrap_or(Color::Reset)
}

fn pair_style(pair: &ColorPair) -> Style {
    Style::default()
        .fg(parse_color(pair.fg()))
        .bg(parse_color(pair.bg()))
}

impl Palette {
    pub fn from_scheme(scheme: &ColorScheme) -> Self {
        Palette {
            header: pair_style(&scheme.header),
            footer: pair_style(&scheme.footer),
            selected: pair_style(&scheme.selected),
            normal: pair_style(&scheme.normal),
            highlight: pair_style(&scheme.highlight),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::from_scheme(&ColorScheme::default_scheme())
    }
}
