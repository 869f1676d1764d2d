// Status bar widget: connection status, player identity, room, notices.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::{ConnectionStatus, Screen};
use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [connection indicator] [nickname] | [screen or room] [notice]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let palette = state.palette();
    let mut spans = Vec::new();

    let (dot, dot_color) = connection_indicator(state.connection_status);
    spans.push(Span::styled(format!(" {} ", dot), Style::default().fg(dot_color)));

    let who = if state.nickname.is_empty() {
        "not logged in"
    } else {
        state.nickname.as_str()
    };
    spans.push(Span::styled(who.to_string(), Style::default().add_modifier(Modifier::BOLD)));
    spans.push(Span::styled(" | ", palette.dim()));
    spans.push(Span::raw(location_label(state)));

    if let Some(notice) = state.notice_text() {
        spans.push(Span::styled(" | ", palette.dim()));
        spans.push(Span::styled(
            notice.to_string(),
            Style::default().fg(palette.warning).add_modifier(Modifier::BOLD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(palette.bar());
    frame.render_widget(paragraph, area);
}

/// Return the connection dot character and its color.
pub fn connection_indicator(status: ConnectionStatus) -> (&'static str, Color) {
    match status {
        ConnectionStatus::Connected => ("●", Color::Green),
        ConnectionStatus::Connecting => ("●", Color::Yellow),
        ConnectionStatus::Disconnected => ("●", Color::Red),
    }
}

/// Where the user is: the screen name, or the room on the game screen.
pub fn location_label(state: &ViewState) -> String {
    match state.screen {
        Screen::Login => "Login".to_string(),
        Screen::Lobby => "Lobby".to_string(),
        Screen::Gallery => "Gallery".to_string(),
        Screen::Game => match &state.game {
            Some(game) => format!("Room: {}", game.room.name),
            None => "Joining room...".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::tui::widgets::buffer_text;

    #[test]
    fn connection_indicator_colors() {
        assert_eq!(connection_indicator(ConnectionStatus::Connected), ("●", Color::Green));
        assert_eq!(connection_indicator(ConnectionStatus::Connecting), ("●", Color::Yellow));
        assert_eq!(connection_indicator(ConnectionStatus::Disconnected), ("●", Color::Red));
    }

    #[test]
    fn location_before_snapshot() {
        let state = ViewState {
            screen: Screen::Game,
            ..ViewState::default()
        };
        assert_eq!(location_label(&state), "Joining room...");
    }

    #[test]
    fn shows_nickname_and_notice() {
        let state = ViewState {
            screen: Screen::Lobby,
            nickname: "alice".into(),
            notice: Some(("It is White's turn.".into(), Instant::now())),
            ..ViewState::default()
        };
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("alice | Lobby"));
        assert!(text.contains("It is White's turn."));
    }

    #[test]
    fn render_does_not_panic_with_defaults() {
        let backend = ratatui::backend::TestBackend::new(80, 1);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        let state = ViewState::default();
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();
        assert!(buffer_text(&terminal).contains("not logged in"));
    }
}
