use ratatui::prelude::{Color, Modifier, Style};

use crate::config::Theme;

/// Resolved colors for one theme.
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub accent: Color,
    pub danger: Color,
    pub success: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Palette {
                bg: Color::Black,
                fg: Color::White,
                dim: Color::DarkGray,
                accent: Color::LightBlue,
                danger: Color::LightRed,
                success: Color::LightGreen,
            },
            Theme::Light => Palette {
                bg: Color::White,
                fg: Color::Black,
                dim: Color::Gray,
                accent: Color::Blue,
                danger: Color::Red,
                success: Color::Green,
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.dim)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.danger)
    }

    pub fn notice(&self) -> Style {
        Style::default().fg(self.success)
    }
}
