use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone)]
pub struct ResolvedTheme {
    pub variant: ThemeVariant,
    pub foreground: Color,
    pub foreground_dim: Color,
    pub border: Color,
    pub selection_bg: Color,
    pub primary: Color,
    pub error: Color,
    pub card_title: Color,
    pub card_description: Color,
    pub card_meta: Color,
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub spinner: Color,
}

impl ResolvedTheme {
    pub fn dark() -> Self {
        Self {
            variant: ThemeVariant::Dark,
            foreground: Color::Rgb(0xF8, 0xF8, 0xF2),
            foreground_dim: Color::Rgb(0x75, 0x71, 0x5E),
            border: Color::Rgb(0x75, 0x71, 0x5E),
            selection_bg: Color::Rgb(0x3E, 0x3D, 0x32),
            primary: Color::Rgb(0xE6, 0xDB, 0x74),
            error: Color::Rgb(0xF9, 0x26, 0x72),
            card_title: Color::Rgb(0xF8, 0xF8, 0xF2),
            card_description: Color::Rgb(0x66, 0xD9, 0xEF),
            card_meta: Color::Rgb(0xA6, 0xE2, 0x2E),
            status_bar_bg: Color::Rgb(0x27, 0x28, 0x22),
            status_bar_fg: Color::Rgb(0xF8, 0xF8, 0xF2),
            spinner: Color::Rgb(0xE6, 0xDB, 0x74),
        }
    }

    pub fn light() -> Self {
        Self {
            variant: ThemeVariant::Light,
            foreground: Color::Black,
            foreground_dim: Color::Rgb(0x6E, 0x6E, 0x6E),
            border: Color::Rgb(0xA0, 0xA0, 0xA0),
            selection_bg: Color::Rgb(0xE4, 0xE4, 0xE4),
            primary: Color::Rgb(0x33, 0x66, 0xCC),
            error: Color::Red,
            card_title: Color::Black,
            card_description: Color::Rgb(0x33, 0x66, 0xCC),
            card_meta: Color::Rgb(0x2E, 0x7D, 0x32),
            status_bar_bg: Color::Rgb(0xE4, 0xE4, 0xE4),
            status_bar_fg: Color::Black,
            spinner: Color::Rgb(0x33, 0x66, 0xCC),
        }
    }

    pub fn for_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn selection_style(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.foreground_dim)
    }

    pub fn title_style(&self, seen: bool) -> Style {
        if seen {
            self.dim_style()
        } else {
            Style::default()
                .fg(self.card_title)
                .add_modifier(Modifier::BOLD)
        }
    }

    pub fn active_tab_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn spinner_style(&self) -> Style {
        Style::default().fg(self.spinner)
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .bg(self.status_bar_bg)
            .fg(self.status_bar_fg)
    }
}

/// Guesses the terminal background from its luma. Falls back to dark when
/// the terminal does not answer.
pub fn detect_terminal_theme() -> ThemeVariant {
    match terminal_light::luma() {
        Ok(luma) if luma > 0.6 => ThemeVariant::Light,
        Ok(_) => ThemeVariant::Dark,
        Err(err) => {
            debug!(error = %err, "terminal background detection failed");
            ThemeVariant::Dark
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_variant() {
        assert_eq!(ResolvedTheme::for_variant(ThemeVariant::Dark).variant, ThemeVariant::Dark);
        assert_eq!(
            ResolvedTheme::for_variant(ThemeVariant::Light).variant,
            ThemeVariant::Light
        );
    }

    #[test]
    fn test_seen_titles_are_dimmed() {
        let theme = ResolvedTheme::dark();
        assert_eq!(theme.title_style(true), theme.dim_style());
        assert_ne!(theme.title_style(false), theme.dim_style());
    }
}
