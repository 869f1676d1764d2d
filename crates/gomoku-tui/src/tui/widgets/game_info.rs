// Game info panel: room, my stone, whose turn it is, and the players seen.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use gomoku_core::message::StoneColor;
use gomoku_core::session::PlayerInfo;

use crate::protocol::GameSnapshot;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let palette = state.palette();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(" Game ", palette.title()));

    let Some(game) = &state.game else {
        frame.render_widget(Paragraph::new(" Connecting...").style(palette.dim()).block(block), area);
        return;
    };

    let mut lines = vec![
        Line::from(vec![Span::styled(" Room: ", palette.dim()), Span::raw(game.room.name.clone())]),
        Line::from(vec![Span::styled(" You:  ", palette.dim()), Span::raw(my_stone_label(game.my_color))]),
        Line::from(vec![
            Span::styled(" Turn: ", palette.dim()),
            Span::styled(
                turn_label(game),
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    if !game.players.is_empty() {
        lines.push(Line::styled(" Players:", palette.dim()));
        for player in &game.players {
            lines.push(player_line(player, state));
        }
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// What this client plays as.
pub fn my_stone_label(color: StoneColor) -> String {
    match color {
        StoneColor::Black => "● Black".to_string(),
        StoneColor::White => "○ White".to_string(),
        StoneColor::None => "Spectator".to_string(),
    }
}

/// Turn indicator text, relative to this client's color.
pub fn turn_label(game: &GameSnapshot) -> String {
    if game.game_ended {
        return "Game over".to_string();
    }
    if game.my_color.is_player() && game.turn == game.my_color {
        "Your turn".to_string()
    } else {
        format!("{}'s turn", game.turn.label())
    }
}

fn player_line(player: &PlayerInfo, state: &ViewState) -> Line<'static> {
    let marker = match player.color {
        StoneColor::Black => "●",
        StoneColor::White => "○",
        StoneColor::None => "·",
    };
    let mut spans = vec![Span::raw(format!("  {} {}", marker, player.name))];
    if let Some(url) = &player.skin_url {
        spans.push(Span::styled(
            format!("  [{}]", state.display_skin(url)),
            state.palette().dim(),
        ));
    }
    Line::from(spans)
}
