use ratatui::style::Color;

use crate::model::config::UiConfig;

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub done: Color,
    pub due: Color,
    pub error: Color,
    pub selection_bg: Color,
    pub search_match_bg: Color,
    pub search_match_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x0B, 0x10, 0x16),
            text: Color::Rgb(0xC8, 0xD3, 0xDE),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0x4C, 0xA6, 0xFF),
            dim: Color::Rgb(0x5C, 0x6A, 0x78),
            done: Color::Rgb(0x3F, 0xA3, 0x6D),
            due: Color::Rgb(0xE5, 0xC0, 0x7B),
            error: Color::Rgb(0xFF, 0x5D, 0x5D),
            selection_bg: Color::Rgb(0x1A, 0x2B, 0x3D),
            search_match_bg: Color::Rgb(0x40, 0xE0, 0xD0),
            search_match_fg: Color::Rgb(0x0B, 0x10, 0x16),
        }
    }
}

impl Theme {
    /// Default theme with any configured hex overrides applied.
    pub fn from_config(ui: &UiConfig) -> Theme {
        let mut theme = Theme::default();
        apply(&mut theme.background, &ui.background);
        apply(&mut theme.text, &ui.text);
        apply(&mut theme.highlight, &ui.highlight);
        apply(&mut theme.dim, &ui.dim);
        apply(&mut theme.done, &ui.done);
        apply(&mut theme.due, &ui.due);
        apply(&mut theme.error, &ui.error);
        theme
    }
}

fn apply(slot: &mut Color, configured: &Option<String>) {
    if let Some(color) = configured.as_deref().and_then(parse_hex_color) {
        *slot = color;
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#FF4444"), Some(Color::Rgb(0xFF, 0x44, 0x44)));
        assert_eq!(parse_hex_color("FF4444"), None);
        assert_eq!(parse_hex_color("#FF444"), None);
        assert_eq!(parse_hex_color("#GG4444"), None);
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let ui = UiConfig {
            highlight: Some("#112233".into()),
            dim: Some("nonsense".into()),
            ..UiConfig::default()
        };
        let theme = Theme::from_config(&ui);
        assert_eq!(theme.highlight, Color::Rgb(0x11, 0x22, 0x33));
        assert_eq!(theme.dim, Theme::default().dim);
    }
}
