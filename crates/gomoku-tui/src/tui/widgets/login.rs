// Login form: nickname and an optional skin image to upload.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use super::modal::centered_rect;
use crate::tui::{LoginField, ViewState};

const FORM_WIDTH: u16 = 56;
const FORM_HEIGHT: u16 = 12;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let palette = state.palette();
    let form = centered_rect(FORM_WIDTH, FORM_HEIGHT, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(Span::styled(" Face Gomoku ", palette.title()));
    let inner = block.inner(form);
    frame.render_widget(block, form);

    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .split(inner);

    frame.render_widget(
        Paragraph::new(Line::styled(" Pick a nickname and, optionally, a face for your stones.", palette.dim())),
        rows[0],
    );
    render_field(
        frame,
        rows[1],
        "Nickname",
        &state.login_nickname,
        state.login_focus == LoginField::Nickname,
        state,
    );
    render_field(
        frame,
        rows[2],
        "Skin image path (optional)",
        &state.login_skin,
        state.login_focus == LoginField::SkinPath,
        state,
    );
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, focused: bool, state: &ViewState) {
    let palette = state.palette();
    let border = if focused {
        Style::default().fg(palette.accent)
    } else {
        palette.dim()
    };
    let mut spans = vec![Span::raw(value.to_string())];
    if focused {
        spans.push(Span::styled("_", Style::default().fg(palette.accent).add_modifier(Modifier::SLOW_BLINK)));
    }
    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!(" {label} ")),
    );
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::widgets::buffer_text;

    #[test]
    fn shows_both_fields() {
        let state = ViewState {
            login_nickname: "alice".into(),
            login_skin: "face.png".into(),
            login_focus: LoginField::SkinPath,
            ..ViewState::default()
        };
        let backend = ratatui::backend::TestBackend::new(80, 20);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Nickname"));
        assert!(text.contains("alice"));
        assert!(!text.contains("alice_"));
        assert!(text.contains("face.png_"));
    }
}
