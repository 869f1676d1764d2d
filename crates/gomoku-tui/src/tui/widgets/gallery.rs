// Gallery widget: the user's uploaded and linked images.
//
// Starred images are marked with a star. The image currently used as the
// player's skin is tagged "(in use)".

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use gomoku_core::message::ImageInfo;

use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let palette = state.palette();
    let rows = Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(format!(" My Images ({}) ", state.images.len()), palette.title()));

    if state.images.is_empty() {
        let paragraph = Paragraph::new("  No images yet. Press u to upload or l to link one.")
            .style(palette.dim())
            .block(block);
        frame.render_widget(paragraph, rows[0]);
    } else {
        let items: Vec<ListItem> = state
            .images
            .iter()
            .map(|image| ListItem::new(image_line(image, state.skin_url.as_deref())))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(palette.highlight).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut list_state = ListState::default().with_selected(Some(state.selected_image));
        frame.render_stateful_widget(list, rows[0], &mut list_state);
    }

    let detail = match state.selected_image() {
        Some(image) => Line::from(vec![
            Span::styled("URL: ", palette.dim()),
            Span::raw(state.display_skin(&image.url).to_string()),
        ]),
        None => Line::styled("Nothing selected", palette.dim()),
    };
    let paragraph = Paragraph::new(detail).block(Block::default().borders(Borders::ALL).title(" Selected "));
    frame.render_widget(paragraph, rows[1]);
}

/// Format one gallery row.
pub fn image_line(image: &ImageInfo, current_skin: Option<&str>) -> String {
    let star = if image.starred { "★" } else { "☆" };
    let in_use = if current_skin == Some(image.url.as_str()) {
        "  (in use)"
    } else {
        ""
    };
    format!("{} {}{}", star, image.display_name(), in_use)
}
