// Chat log widget: room chat and system announcements.
//
// Oldest at the top, newest at the bottom. Each line:
//   "[HH:MM] {sender}: {text}" for players
//   "[HH:MM] * {text}"         for system messages
// PageUp/PageDown scroll back through history.

use ratatui::layout::{Margin, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState};
use ratatui::Frame;

use gomoku_core::session::{ChatKind, ChatLine};

use crate::tui::theme::Palette;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let palette = state.palette();
    let title = if state.chat_scroll > 0 {
        format!(" Chat ({}) [scrolled] ", state.chat.len())
    } else {
        format!(" Chat ({}) ", state.chat.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, palette.title()));

    if state.chat.is_empty() {
        let paragraph = Paragraph::new("  No messages yet. Press i to chat.")
            .style(palette.dim())
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // Visible row count: subtract 2 for borders
    let visible_rows = (area.height as usize).saturating_sub(2).max(1);
    let total = state.chat.len();
    let (start, end) = visible_window(total, visible_rows, state.chat_scroll);

    let lines: Vec<Line> = state
        .chat
        .iter()
        .skip(start)
        .take(end - start)
        .map(|line| chat_line(line, &palette))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);

    if total > visible_rows {
        let mut scrollbar_state =
            ScrollbarState::new(total.saturating_sub(visible_rows)).position(start);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            area.inner(Margin { vertical: 1, horizontal: 0 }),
            &mut scrollbar_state,
        );
    }
}

/// Index range of the chat lines to show, `scroll` lines back from the end.
pub fn visible_window(total: usize, rows: usize, scroll: usize) -> (usize, usize) {
    let max_scroll = total.saturating_sub(rows);
    let end = total - scroll.min(max_scroll);
    (end.saturating_sub(rows), end)
}

/// Plain text of a chat line, without styling.
pub fn format_chat(line: &ChatLine) -> String {
    let time = line.at.format("%H:%M");
    match (line.kind, &line.sender) {
        (ChatKind::Player, Some(sender)) => format!("[{}] {}: {}", time, sender, line.text),
        _ => format!("[{}] * {}", time, line.text),
    }
}

fn chat_line(line: &ChatLine, palette: &Palette) -> Line<'static> {
    let style = match line.kind {
        ChatKind::System => Style::default().fg(palette.accent).add_modifier(Modifier::ITALIC),
        ChatKind::Player => Style::default().fg(palette.fg),
    };
    Line::from(Span::styled(format_chat(line), style))
}
