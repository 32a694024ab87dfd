//! Palette for the weather screen
//! Optionally read from a kitty.conf-style color file (`theme_file` in config)

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Focused borders, selected unit, key hints
    pub danger: Color,      // Fetch error line
    pub text: Color,
    pub text_dim: Color,    // Labels, coordinates, placeholders
    pub bg_selected: Color, // Highlighted search result
    pub inactive: Color,    // Unfocused borders
    pub header: Color,      // Title and section headings
    pub day: Color,
    pub night: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // Sky-blue accent on a Catppuccin-like base
        Self {
            accent: Color::Rgb(137, 180, 250),
            danger: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(116, 199, 236),
            day: Color::Rgb(249, 226, 175),
            night: Color::Rgb(180, 190, 254),
        }
    }
}

impl Theme {
    /// Load the palette from `path`, or the defaults when absent or unreadable
    pub fn load(path: Option<&Path>) -> Self {
        path.and_then(Self::from_file).unwrap_or_default()
    }

    fn from_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Could not read theme file {}: {}", path.display(), e);
                return None;
            }
        };
        Self::from_kitty_conf(&content)
    }

    /// Map kitty color slots onto the palette, keeping defaults for missing ones
    fn from_kitty_conf(content: &str) -> Option<Self> {
        let colors = Self::parse_kitty_conf(content);
        if colors.is_empty() {
            return None;
        }

        let base = Self::default();
        let pick = |keys: &[&str], fallback: Color| {
            keys.iter()
                .find_map(|k| colors.get(*k))
                .copied()
                .unwrap_or(fallback)
        };

        Some(Self {
            accent: pick(&["color4", "color12"], base.accent),
            danger: pick(&["color1", "color9"], base.danger),
            text: pick(&["foreground"], base.text),
            text_dim: pick(&["color8"], base.text_dim),
            bg_selected: pick(&["selection_background", "color0"], base.bg_selected),
            inactive: pick(&["inactive_border_color", "color8"], base.inactive),
            header: pick(&["color6", "color14"], base.header),
            day: pick(&["color3", "color11"], base.day),
            night: pick(&["color5", "color13"], base.night),
        })
    }

    /// Parse kitty.conf format: `key value` or `key #hexcolor`
    fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once(char::is_whitespace)?;
                Some((key.trim().to_string(), Self::parse_hex_color(value)?))
            })
            .collect()
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }
        let channel = |hex: &str| u8::from_str_radix(hex, 16).ok();

        match s.len() {
            6 => Some(Color::Rgb(channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?)),
            3 => Some(Color::Rgb(
                channel(&s[0..1])? * 17,
                channel(&s[1..2])? * 17,
                channel(&s[2..3])? * 17,
            )),
            _ => None,
        }
    }
}
