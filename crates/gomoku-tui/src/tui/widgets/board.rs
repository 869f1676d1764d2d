// Board widget: the 15x15 grid, stones, cursor and highlights.
//
// Each intersection takes one column and intersections are three columns
// apart, so a row reads " ┼──┼──...──┼ " (45 columns). Mouse positions are
// mapped back to intersections with `BoardGeometry::terminal()`.
//
// Stones: ● black, ○ white. A stone placed with a skin is drawn as ◉ or ◎.
// The last move and the winning line get the highlight background; the
// keyboard cursor is drawn reversed.

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use gomoku_core::board::{Board, BoardGeometry, Cell, Placed, BOARD_SIZE};
use gomoku_core::message::StoneColor;

use crate::tui::theme::Palette;
use crate::tui::ViewState;

/// Horizontal line drawn between neighboring intersections.
const SEGMENT: &str = "──";

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let palette = state.palette();
    let title = match &state.game {
        Some(game) if game.game_ended => " Board (game over) ",
        _ => " Board ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(title, palette.title()))
        .style(Style::default().bg(palette.board_bg).fg(palette.grid));

    let Some(game) = &state.game else {
        let paragraph = Paragraph::new(" Joining room...").block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let marks = Marks {
        cursor: Some(state.cursor),
        last_move: game.last_move,
        winning_line: game.winning_line.as_deref().unwrap_or(&[]),
    };
    let lines: Vec<Line> = (0..BOARD_SIZE)
        .map(|row| row_line(&game.board, row, &marks, &palette))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// The drawable area inside the board's border.
pub fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

/// Map a terminal position inside `inner` to the nearest intersection.
pub fn cell_at(inner: Rect, column: u16, row: u16) -> Option<Cell> {
    let x = column.checked_sub(inner.x)?;
    let y = row.checked_sub(inner.y)?;
    BoardGeometry::terminal().pixel_to_cell(f64::from(x), f64::from(y))
}

/// Cells that get special styling.
struct Marks<'a> {
    cursor: Option<Cell>,
    last_move: Option<Cell>,
    winning_line: &'a [Cell],
}

fn row_line(board: &Board, row: usize, marks: &Marks<'_>, palette: &Palette) -> Line<'static> {
    let grid = Style::default().fg(palette.grid);
    let mut spans = Vec::with_capacity(BOARD_SIZE * 2 + 1);
    spans.push(Span::styled(" ", grid));
    for col in 0..BOARD_SIZE {
        if col > 0 {
            spans.push(Span::styled(SEGMENT, grid));
        }
        let cell = Cell::new(row, col);
        let placed = board.get(cell);
        let mut style = match placed {
            Some(stone) => stone_style(stone.color, palette),
            None => grid,
        };
        if marks.winning_line.contains(&cell) || marks.last_move == Some(cell) {
            style = style.bg(palette.highlight);
        }
        if marks.cursor == Some(cell) {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.push(Span::styled(glyph(placed, cell), style));
    }
    spans.push(Span::styled(" ", grid));
    Line::from(spans)
}

fn stone_style(color: StoneColor, palette: &Palette) -> Style {
    let fg = match color {
        StoneColor::White => palette.white_stone,
        _ => palette.black_stone,
    };
    Style::default().fg(fg).add_modifier(Modifier::BOLD)
}

/// Plain text of one board row, without styling.
pub fn row_text(board: &Board, row: usize) -> String {
    let glyphs: Vec<&str> = (0..BOARD_SIZE)
        .map(|col| {
            let cell = Cell::new(row, col);
            glyph(board.get(cell), cell)
        })
        .collect();
    format!(" {} ", glyphs.join(SEGMENT))
}

/// Character drawn at an intersection.
pub fn glyph(placed: Option<&Placed>, cell: Cell) -> &'static str {
    match placed {
        Some(stone) => match (stone.color, stone.skin_url.is_some()) {
            (StoneColor::White, false) => "○",
            (StoneColor::White, true) => "◎",
            (_, false) => "●",
            (_, true) => "◉",
        },
        None => grid_glyph(cell),
    }
}

fn grid_glyph(cell: Cell) -> &'static str {
    let last = BOARD_SIZE - 1;
    match (cell.row, cell.col) {
        (0, 0) => "┌",
        (0, c) if c == last => "┐",
        (0, _) => "┬",
        (r, 0) if r == last => "└",
        (r, c) if r == last && c == last => "┘",
        (r, _) if r == last => "┴",
        (_, 0) => "├",
        (_, c) if c == last => "┤",
        _ => "┼",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{GameSnapshot, Screen};
    use crate::tui::widgets::buffer_text;
    use gomoku_core::session::RoomRef;

    fn stone(color: StoneColor, skin: Option<&str>) -> Placed {
        Placed {
            color,
            skin_url: skin.map(str::to_string),
        }
    }

    fn game_with(board: Board) -> GameSnapshot {
        GameSnapshot {
            room: RoomRef {
                id: "r1".into(),
                name: "Fun".into(),
            },
            my_color: StoneColor::Black,
            turn: StoneColor::White,
            game_ended: false,
            board,
            last_move: None,
            winning_line: None,
            players: vec![],
        }
    }

    #[test]
    fn empty_rows_span_grid_width() {
        let board = Board::new();
        let top = row_text(&board, 0);
        assert_eq!(top.chars().count(), 45);
        assert!(top.starts_with(" ┌──┬"));
        assert!(top.ends_with("┬──┐ "));
        assert!(row_text(&board, 7).starts_with(" ├──┼"));
        assert!(row_text(&board, 14).ends_with("┴──┘ "));
    }

    #[test]
    fn stones_use_color_and_skin_glyphs() {
        let mut board = Board::new();
        board.place(Cell::new(0, 0), stone(StoneColor::Black, None));
        board.place(Cell::new(0, 1), stone(StoneColor::White, None));
        board.place(Cell::new(0, 2), stone(StoneColor::Black, Some("/u/a.png")));
        board.place(Cell::new(0, 3), stone(StoneColor::White, Some("/u/b.png")));
        assert!(row_text(&board, 0).starts_with(" ●──○──◉──◎──┬"));
    }

    #[test]
    fn glyph_column_matches_click_mapping() {
        let inner = Rect::new(10, 5, 45, 15);
        let mut board = Board::new();
        board.place(Cell::new(2, 6), stone(StoneColor::Black, None));
        let text: Vec<char> = row_text(&board, 2).chars().collect();
        let x = 1 + 6 * 3;
        assert_eq!(text[x], '●');
        assert_eq!(cell_at(inner, inner.x + x as u16, inner.y + 2), Some(Cell::new(2, 6)));
    }

    #[test]
    fn cell_at_edges() {
        let inner = Rect::new(10, 5, 45, 15);
        assert_eq!(cell_at(inner, 9, 5), None);
        assert_eq!(cell_at(inner, 10, 4), None);
        assert_eq!(cell_at(inner, 10, 5), Some(Cell::new(0, 0)));
        assert_eq!(cell_at(inner, 10 + 44, 5 + 14), Some(Cell::new(14, 14)));
    }

    #[test]
    fn inner_strips_border() {
        assert_eq!(inner(Rect::new(0, 1, 47, 17)), Rect::new(1, 2, 45, 15));
    }

    #[test]
    fn renders_stones_and_highlights() {
        let mut board = Board::new();
        board.place(Cell::new(7, 7), stone(StoneColor::Black, None));
        let mut game = game_with(board);
        game.last_move = Some(Cell::new(7, 7));
        let state = ViewState {
            screen: Screen::Game,
            cursor: Cell::new(0, 0),
            game: Some(game),
            ..ViewState::default()
        };
        let backend = ratatui::backend::TestBackend::new(47, 17);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();

        let palette = state.palette();
        let buffer = terminal.backend().buffer();
        // Border (1) + padding (1) + 7 * 3
        let stone_cell = &buffer[(1 + 1 + 21_u16, 1 + 7_u16)];
        assert_eq!(stone_cell.symbol(), "●");
        assert_eq!(stone_cell.bg, palette.highlight);
        let cursor_cell = &buffer[(2_u16, 1_u16)];
        assert_eq!(cursor_cell.symbol(), "┌");
        assert!(cursor_cell.modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn placeholder_before_snapshot() {
        let state = ViewState {
            screen: Screen::Game,
            ..ViewState::default()
        };
        let backend = ratatui::backend::TestBackend::new(47, 17);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(frame, frame.area(), &state)).unwrap();
        assert!(buffer_text(&terminal).contains("Joining room..."));
    }
}
