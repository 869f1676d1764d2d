// Victory banner shown for a couple of seconds after GAME_OVER.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::modal::centered_rect;
use crate::tui::theme::Palette;
use crate::tui::Celebration;

const BANNER_WIDTH: u16 = 40;
const BANNER_HEIGHT: u16 = 5;

pub fn render(frame: &mut Frame, area: Rect, celebration: &Celebration, palette: &Palette) {
    let banner = centered_rect(BANNER_WIDTH, BANNER_HEIGHT, area);
    frame.render_widget(Clear, banner);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.highlight).add_modifier(Modifier::BOLD))
        .title(Span::styled(" ★ ★ ★ ", palette.title()));
    let text = Line::styled(
        banner_text(celebration.winner_name.as_deref()),
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
    )
    .centered();
    let paragraph = Paragraph::new(vec![Line::raw(""), text]).block(block).style(palette.base());
    frame.render_widget(paragraph, banner);
}

pub fn banner_text(winner: Option<&str>) -> String {
    match winner {
        Some(name) => format!("{name} wins!"),
        None => "Game over!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::tui::widgets::buffer_text;
    use gomoku_core::prefs::Theme;

    #[test]
    fn banner_names_winner() {
        assert_eq!(banner_text(Some("alice")), "alice wins!");
        assert_eq!(banner_text(None), "Game over!");
    }

    #[test]
    fn renders_banner() {
        let celebration = Celebration {
            winner_name: Some("bob".into()),
            until: Instant::now(),
        };
        let backend = ratatui::backend::TestBackend::new(60, 12);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), &celebration, &Palette::for_theme(Theme::Dark)))
            .unwrap();
        assert!(buffer_text(&terminal).contains("bob wins!"));
    }
}
