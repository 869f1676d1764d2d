// Overlay dialogs: alerts, the quit confirmation, and the one-line prompt.
//
// Alerts and the quit dialog are drawn centered on top of whatever screen is
// active. The prompt lives in its own row above the help bar.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::tui::theme::Palette;
use crate::tui::Prompt;

/// Width and height of the quit confirmation dialog.
const QUIT_WIDTH: u16 = 28;
const QUIT_HEIGHT: u16 = 5;

/// Alerts grow with their text up to this width.
const ALERT_MAX_WIDTH: u16 = 60;

/// Render the quit confirmation overlay centered on the screen.
pub fn render_quit_confirm(frame: &mut Frame, area: Rect, palette: &Palette) {
    let dialog_area = centered_rect(QUIT_WIDTH, QUIT_HEIGHT, area);

    // Clear the area behind the dialog so it renders cleanly on top
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.warning))
        .title(Span::styled(
            " Quit? ",
            Style::default().fg(palette.warning).add_modifier(Modifier::BOLD),
        ));

    let text = Line::from(vec![
        Span::raw("  Really quit? ("),
        Span::styled("y", palette.title()),
        Span::raw("/"),
        Span::styled("n", Style::default().fg(palette.warning).add_modifier(Modifier::BOLD)),
        Span::raw(")"),
    ]);

    let paragraph = Paragraph::new(text).block(block).style(palette.base());
    frame.render_widget(paragraph, dialog_area);
}

/// Render a blocking message box. Enter or Esc dismisses it.
pub fn render_alert(frame: &mut Frame, area: Rect, text: &str, palette: &Palette) {
    let width = alert_width(text);
    let dialog_area = centered_rect(width, 5, area);
    frame.render_widget(Clear, dialog_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(Span::styled(" Notice ", palette.title()))
        .title_bottom(Line::from(" Enter: OK ").right_aligned());

    let paragraph = Paragraph::new(format!(" {text}"))
        .wrap(Wrap { trim: false })
        .block(block)
        .style(palette.base());
    frame.render_widget(paragraph, dialog_area);
}

/// Render the one-line text prompt with a trailing cursor.
pub fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt, palette: &Palette) {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(Span::styled(format!(" {} ", prompt.kind.title()), palette.title()))
        .title_bottom(Line::from(" Enter: send  Esc: cancel ").right_aligned());

    let line = Line::from(vec![
        Span::raw(prompt.text.as_str()),
        Span::styled("_", Style::default().fg(palette.accent).add_modifier(Modifier::SLOW_BLINK)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block).style(palette.base()), area);
}

/// Dialog width for an alert: text plus borders and padding, clamped.
fn alert_width(text: &str) -> u16 {
    let len = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
    len.saturating_add(4).clamp(24, ALERT_MAX_WIDTH)
}

/// Compute a centered rectangle of the given size within `area`.
///
/// If the area is too small, the dialog is clamped to the available space.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let clamped_width = width.min(area.width);
    let clamped_height = height.min(area.height);

    let vertical = Layout::vertical([Constraint::Length(clamped_height)])
        .flex(Flex::Center)
        .split(area);

    let horizontal = Layout::horizontal([Constraint::Length(clamped_width)])
        .flex(Flex::Center)
        .split(vertical[0]);

    horizontal[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
