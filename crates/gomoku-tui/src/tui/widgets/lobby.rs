// Lobby widget: welcome line and the list of open rooms.
//
// Each row: "{name}  {n} players  [playing|waiting]". The selected row is
// highlighted; Enter joins it.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use gomoku_core::message::RoomSummary;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let palette = state.palette();
    let rows = Layout::vertical([Constraint::Length(2), Constraint::Min(3)]).split(area);

    let mut welcome = vec![
        Span::raw(" Welcome, "),
        Span::styled(state.nickname.clone(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("!"),
    ];
    if let Some(url) = &state.skin_url {
        welcome.push(Span::styled(format!("  Skin: {}", state.display_skin(url)), palette.dim()));
    }
    frame.render_widget(Paragraph::new(Line::from(welcome)), rows[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" Rooms ({}) ", state.rooms.len()), palette.title()));

    if state.rooms.is_empty() {
        let paragraph = Paragraph::new("  No rooms yet. Press c to create one.")
            .style(palette.dim())
            .block(block);
        frame.render_widget(paragraph, rows[1]);
        return;
    }

    let items: Vec<ListItem> = state.rooms.iter().map(|room| ListItem::new(room_line(room))).collect();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(Some(state.selected_room));
    frame.render_stateful_widget(list, rows[1], &mut list_state);
}

/// Format one room row.
pub fn room_line(room: &RoomSummary) -> String {
    let count = room.user_count();
    let players = if count == 1 { "player" } else { "players" };
    let status = if room.playing { "playing" } else { "waiting" };
    format!("{}  {} {}  [{}]", room.room_name, count, players, status)
}
