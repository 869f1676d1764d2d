// Light and dark color palettes.

use ratatui::style::{Color, Modifier, Style};

use gomoku_core::prefs::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub fg: Color,
    pub bg: Color,
    pub muted: Color,
    pub accent: Color,
    pub warning: Color,
    pub board_bg: Color,
    pub grid: Color,
    pub black_stone: Color,
    pub white_stone: Color,
    /// Background of the last move and the winning line.
    pub highlight: Color,
    pub bar_bg: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Palette {
        match theme {
            Theme::Light => Palette {
                fg: Color::Black,
                bg: Color::Rgb(250, 248, 240),
                muted: Color::Rgb(120, 120, 120),
                accent: Color::Rgb(40, 90, 180),
                warning: Color::Rgb(190, 60, 40),
                board_bg: Color::Rgb(227, 201, 134),
                grid: Color::Rgb(60, 45, 20),
                black_stone: Color::Black,
                white_stone: Color::White,
                highlight: Color::Rgb(140, 200, 120),
                bar_bg: Color::Rgb(220, 215, 200),
            },
            Theme::Dark => Palette {
                fg: Color::Rgb(225, 225, 225),
                bg: Color::Rgb(24, 24, 28),
                muted: Color::DarkGray,
                accent: Color::Cyan,
                warning: Color::Yellow,
                board_bg: Color::Rgb(110, 86, 44),
                grid: Color::Rgb(30, 22, 10),
                black_stone: Color::Black,
                white_stone: Color::White,
                highlight: Color::Rgb(60, 130, 70),
                bar_bg: Color::Rgb(45, 45, 50),
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn bar(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bar_bg)
    }
}
