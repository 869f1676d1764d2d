// Board geometry and the local stone mirror.
//
// The server owns the real board. The client keeps a mirror of every stone it
// has seen broadcast so it can draw the position, refuse clicks on occupied
// intersections, and highlight the winning line once the server declares a
// winner.

use serde::{Deserialize, Serialize};

use crate::message::StoneColor;

/// Number of lines in each direction (the board is `BOARD_SIZE x BOARD_SIZE`).
pub const BOARD_SIZE: usize = 15;

/// Stones in a row needed to win.
pub const WIN_LENGTH: usize = 5;

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A grid intersection addressed by row and column, both zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    /// Build a cell from signed wire coordinates, rejecting anything that
    /// falls outside the board.
    pub fn checked(row: i64, col: i64) -> Option<Self> {
        let size = BOARD_SIZE as i64;
        if (0..size).contains(&row) && (0..size).contains(&col) {
            Some(Cell::new(row as usize, col as usize))
        } else {
            None
        }
    }

    /// Step `k` intersections along `(dr, dc)`, or `None` if that leaves the
    /// board.
    fn offset(self, dr: i64, dc: i64, k: i64) -> Option<Self> {
        Cell::checked(self.row as i64 + dr * k, self.col as i64 + dc * k)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Maps between pointer positions and grid intersections.
///
/// Positions are measured from the top-left corner of the drawing surface.
/// The first line sits `padding` units in, and consecutive lines are `pitch`
/// units apart. The two axes are independent so the same mapping serves a
/// square-pixel canvas and a terminal whose cells are taller than wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardGeometry {
    pub size: usize,
    pub pitch_x: f64,
    pub pitch_y: f64,
    pub padding_x: f64,
    pub padding_y: f64,
}

impl BoardGeometry {
    /// Uniform geometry with the same pitch and padding on both axes.
    pub fn new(size: usize, pitch: f64, padding: f64) -> Self {
        BoardGeometry {
            size,
            pitch_x: pitch,
            pitch_y: pitch,
            padding_x: padding,
            padding_y: padding,
        }
    }

    /// The 600x600 canvas layout: 40-unit cells with a 20-unit margin.
    pub fn canvas() -> Self {
        BoardGeometry::new(BOARD_SIZE, 40.0, 20.0)
    }

    /// Terminal layout: three columns and one row per intersection, with a
    /// single column of left margin so stones never touch the border.
    pub fn terminal() -> Self {
        BoardGeometry {
            size: BOARD_SIZE,
            pitch_x: 3.0,
            pitch_y: 1.0,
            padding_x: 1.0,
            padding_y: 0.0,
        }
    }

    /// Snap a pointer position to the nearest intersection.
    ///
    /// Returns `None` when the nearest intersection is off the board; callers
    /// drop such input without any feedback.
    pub fn pixel_to_cell(&self, x: f64, y: f64) -> Option<Cell> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let col = round_half_up((x - self.padding_x) / self.pitch_x);
        let row = round_half_up((y - self.padding_y) / self.pitch_y);
        let size = self.size as f64;
        if col < 0.0 || col >= size || row < 0.0 || row >= size {
            return None;
        }
        Some(Cell::new(row as usize, col as usize))
    }

    /// Position of the intersection's center on the drawing surface.
    pub fn cell_center(&self, cell: Cell) -> (f64, f64) {
        (
            self.padding_x + cell.col as f64 * self.pitch_x,
            self.padding_y + cell.row as f64 * self.pitch_y,
        )
    }

    /// Width and height needed to draw every line plus the trailing margin.
    pub fn extent(&self) -> (f64, f64) {
        let span = self.size.saturating_sub(1) as f64;
        (
            2.0 * self.padding_x + span * self.pitch_x + 1.0,
            2.0 * self.padding_y + span * self.pitch_y + 1.0,
        )
    }
}

/// Round to the nearest integer with halves going toward positive infinity,
/// so `-0.5` snaps to `0` rather than `-1`.
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

// ---------------------------------------------------------------------------
// Board mirror
// ---------------------------------------------------------------------------

/// A stone as broadcast by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placed {
    pub color: StoneColor,
    pub skin_url: Option<String>,
}

/// Local copy of the stones broadcast for the current game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    grid: Vec<Option<Placed>>,
}

impl Default for Board {
    fn default() -> Self {
        Board {
            grid: vec![None; BOARD_SIZE * BOARD_SIZE],
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(cell: Cell) -> usize {
        cell.row * BOARD_SIZE + cell.col
    }

    pub fn get(&self, cell: Cell) -> Option<&Placed> {
        self.grid.get(Self::index(cell)).and_then(|p| p.as_ref())
    }

    pub fn is_empty_at(&self, cell: Cell) -> bool {
        self.get(cell).is_none()
    }

    /// Record a broadcast stone. A later broadcast for the same intersection
    /// overwrites the earlier one; the server is authoritative.
    pub fn place(&mut self, cell: Cell, stone: Placed) {
        if let Some(slot) = self.grid.get_mut(Self::index(cell)) {
            *slot = Some(stone);
        }
    }

    pub fn clear(&mut self) {
        self.grid.iter_mut().for_each(|slot| *slot = None);
    }

    pub fn stone_count(&self) -> usize {
        self.grid.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate over occupied intersections in row-major order.
    pub fn stones(&self) -> impl Iterator<Item = (Cell, &Placed)> {
        self.grid.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref()
                .map(|p| (Cell::new(i / BOARD_SIZE, i % BOARD_SIZE), p))
        })
    }

    /// The longest run of at least five same-colored stones passing through
    /// `cell`, ordered from one end to the other.
    ///
    /// Directions are checked horizontal, vertical, diagonal, anti-diagonal;
    /// the first qualifying run wins. Returns `None` for an empty cell or when
    /// no direction reaches five.
    pub fn five_in_row(&self, cell: Cell) -> Option<Vec<Cell>> {
        let color = self.get(cell)?.color;
        if color == StoneColor::None {
            return None;
        }
        const DIRECTIONS: [(i64, i64); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

        for (dr, dc) in DIRECTIONS {
            let same = |k: i64| {
                cell.offset(dr, dc, k)
                    .filter(|c| self.get(*c).is_some_and(|p| p.color == color))
            };

            let mut back = Vec::new();
            let mut k = -1;
            while let Some(c) = same(k) {
                back.push(c);
                k -= 1;
            }
            let mut forward = Vec::new();
            let mut k = 1;
            while let Some(c) = same(k) {
                forward.push(c);
                k += 1;
            }

            if back.len() + 1 + forward.len() >= WIN_LENGTH {
                back.reverse();
                back.push(cell);
                back.extend(forward);
                return Some(back);
            }
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn black() -> Placed {
        Placed {
            color: StoneColor::Black,
            skin_url: None,
        }
    }

    fn white() -> Placed {
        Placed {
            color: StoneColor::White,
            skin_url: None,
        }
    }

    #[test]
    fn canvas_exact_intersections() {
        let g = BoardGeometry::canvas();
        assert_eq!(g.pixel_to_cell(20.0, 20.0), Some(Cell::new(0, 0)));
        assert_eq!(g.pixel_to_cell(60.0, 20.0), Some(Cell::new(0, 1)));
        assert_eq!(g.pixel_to_cell(580.0, 580.0), Some(Cell::new(14, 14)));
    }

    #[test]
    fn canvas_snaps_to_nearest() {
        let g = BoardGeometry::canvas();
        // 19 px right of column 0 is still column 0; 20 px is the midpoint
        // and rounds up to column 1.
        assert_eq!(g.pixel_to_cell(39.0, 20.0), Some(Cell::new(0, 0)));
        assert_eq!(g.pixel_to_cell(40.0, 20.0), Some(Cell::new(0, 1)));
        assert_eq!(g.pixel_to_cell(100.0, 141.0), Some(Cell::new(3, 2)));
    }

    #[test]
    fn canvas_margin_rounds_into_board() {
        let g = BoardGeometry::canvas();
        // (0 - 20) / 40 = -0.5 rounds up to 0.
        assert_eq!(g.pixel_to_cell(0.0, 0.0), Some(Cell::new(0, 0)));
        assert_eq!(g.pixel_to_cell(-0.5, 20.0), None);
    }

    #[test]
    fn canvas_out_of_range_discarded() {
        let g = BoardGeometry::canvas();
        assert_eq!(g.pixel_to_cell(600.0, 20.0), None);
        assert_eq!(g.pixel_to_cell(20.0, 600.0), None);
        assert_eq!(g.pixel_to_cell(-30.0, 20.0), None);
        assert_eq!(g.pixel_to_cell(f64::NAN, 20.0), None);
    }

    #[test]
    fn terminal_geometry_maps_columns() {
        let g = BoardGeometry::terminal();
        assert_eq!(g.pixel_to_cell(1.0, 0.0), Some(Cell::new(0, 0)));
        assert_eq!(g.pixel_to_cell(2.0, 0.0), Some(Cell::new(0, 0)));
        assert_eq!(g.pixel_to_cell(3.0, 0.0), Some(Cell::new(0, 1)));
        assert_eq!(g.pixel_to_cell(43.0, 14.0), Some(Cell::new(14, 14)));
        assert_eq!(g.pixel_to_cell(1.0, 15.0), None);
    }

    #[test]
    fn cell_center_inverts_pixel_to_cell() {
        for g in [BoardGeometry::canvas(), BoardGeometry::terminal()] {
            for cell in [Cell::new(0, 0), Cell::new(7, 3), Cell::new(14, 14)] {
                let (x, y) = g.cell_center(cell);
                assert_eq!(g.pixel_to_cell(x, y), Some(cell));
            }
        }
    }

    #[test]
    fn terminal_extent_fits_board() {
        let (w, h) = BoardGeometry::terminal().extent();
        assert_eq!(w, 45.0);
        assert_eq!(h, 15.0);
    }

    #[test]
    fn checked_cell_bounds() {
        assert_eq!(Cell::checked(0, 0), Some(Cell::new(0, 0)));
        assert_eq!(Cell::checked(14, 14), Some(Cell::new(14, 14)));
        assert_eq!(Cell::checked(15, 0), None);
        assert_eq!(Cell::checked(0, -1), None);
    }

    #[test]
    fn place_get_clear() {
        let mut board = Board::new();
        let c = Cell::new(7, 7);
        assert!(board.is_empty_at(c));
        board.place(c, black());
        assert_eq!(board.get(c).map(|p| p.color), Some(StoneColor::Black));
        assert_eq!(board.stone_count(), 1);
        board.clear();
        assert_eq!(board.stone_count(), 0);
    }

    #[test]
    fn stones_iterates_row_major() {
        let mut board = Board::new();
        board.place(Cell::new(3, 1), white());
        board.place(Cell::new(0, 9), black());
        let cells: Vec<Cell> = board.stones().map(|(c, _)| c).collect();
        assert_eq!(cells, vec![Cell::new(0, 9), Cell::new(3, 1)]);
    }

    #[test]
    fn five_horizontal_found_from_middle() {
        let mut board = Board::new();
        for col in 3..8 {
            board.place(Cell::new(5, col), black());
        }
        let line = board.five_in_row(Cell::new(5, 5)).unwrap();
        assert_eq!(line.len(), 5);
        assert_eq!(line.first(), Some(&Cell::new(5, 3)));
        assert_eq!(line.last(), Some(&Cell::new(5, 7)));
    }

    #[test]
    fn five_anti_diagonal_at_edge() {
        let mut board = Board::new();
        for k in 0..5 {
            board.place(Cell::new(k, 14 - k), white());
        }
        let line = board.five_in_row(Cell::new(0, 14)).unwrap();
        assert_eq!(line.len(), 5);
        assert!(line.contains(&Cell::new(4, 10)));
    }

    #[test]
    fn four_is_not_a_win() {
        let mut board = Board::new();
        for row in 0..4 {
            board.place(Cell::new(row, 0), black());
        }
        board.place(Cell::new(4, 0), white());
        assert!(board.five_in_row(Cell::new(3, 0)).is_none());
    }

    #[test]
    fn overline_counts() {
        let mut board = Board::new();
        for col in 0..6 {
            board.place(Cell::new(9, col), black());
        }
        assert_eq!(board.five_in_row(Cell::new(9, 2)).map(|l| l.len()), Some(6));
    }

    #[test]
    fn empty_cell_has_no_line() {
        let board = Board::new();
        assert!(board.five_in_row(Cell::new(0, 0)).is_none());
    }
}
