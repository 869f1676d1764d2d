// Screen layout: panel arrangement and sizing.
//
// Every screen shares the status bar, prompt row and help bar. The game
// screen splits the body further:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-----------------------+--------------------------+
// | Board (47 x 17)        | Game info (9 rows)       |
// |                        +--------------------------+
// |                        | Chat log (fill)          |
// +-----------------------+--------------------------+
// | Prompt (3 rows)                                   |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use gomoku_core::board::BoardGeometry;

/// Board widget size including its border.
pub fn board_size() -> (u16, u16) {
    let (w, h) = BoardGeometry::terminal().extent();
    (w as u16 + 2, h as u16 + 2)
}

/// Resolved screen areas.
#[derive(Debug, Clone)]
pub struct AppLayout {
    pub status_bar: Rect,
    /// Everything between the status bar and the prompt row.
    pub body: Rect,
    pub board: Rect,
    pub info: Rect,
    pub chat: Rect,
    /// Row used by the one-line text prompt.
    pub input: Rect,
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(5),    // body
            Constraint::Length(3), // prompt
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let status_bar = vertical[0];
    let body = vertical[1];
    let input = vertical[2];
    let help_bar = vertical[3];

    let (board_w, board_h) = board_size();
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(board_w), Constraint::Min(20)])
        .split(body);

    let board_column = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(board_h), Constraint::Min(0)])
        .split(horizontal[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(3)])
        .split(horizontal[1]);

    AppLayout {
        status_bar,
        body,
        board: board_column[0],
        info: side[0],
        chat: side[1],
        input,
        help_bar,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
