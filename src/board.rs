//! Playfield grid, piece shapes and collision.

use rand::Rng;
use std::collections::VecDeque;

/// Playfield width in cells.
pub const COLS: usize = 10;
/// Playfield height in cells.
pub const ROWS: usize = 20;

/// Largest colour index a cell may hold (0 is empty).
pub const MAX_COLOR: u8 = 8;

/// Piece catalogue; each nonzero value is the colour index of that cell.
const SHAPES: [&[&[u8]]; 8] = [
    &[&[8, 8, 8, 8]],
    &[&[1, 1, 1], &[0, 1, 0]],
    &[&[0, 2, 2], &[2, 2, 0]],
    &[&[3, 3, 0], &[0, 3, 3]],
    &[&[4, 4], &[4, 4]],
    &[&[0, 5, 0], &[5, 5, 5]],
    &[&[6, 0, 0], &[6, 6, 6]],
    &[&[0, 0, 7], &[7, 7, 7]],
];

/// Rectangular matrix of colour indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: Vec<Vec<u8>>,
}

impl Shape {
    #[cfg(test)]
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Self {
        debug_assert!(!rows.is_empty() && rows.iter().all(|r| r.len() == rows[0].len()));
        Self { rows }
    }

    /// Catalogue entry `index` (0..8).
    pub fn catalogue(index: usize) -> Self {
        let rows = SHAPES[index % SHAPES.len()]
            .iter()
            .map(|row| row.to_vec())
            .collect();
        Self { rows }
    }

    /// Uniform pick from the catalogue.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::catalogue(rng.random_range(0..SHAPES.len()))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Transpose, then reverse the row order: a quarter turn.
    pub fn rotated(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        let mut rows: Vec<Vec<u8>> = (0..w)
            .map(|c| (0..h).map(|r| self.rows[r][c]).collect())
            .collect();
        rows.reverse();
        Self { rows }
    }

    /// Nonzero cells as (dx, dy, colour).
    pub fn filled(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        self.rows.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(dx, v)| (dx as i32, dy as i32, *v))
        })
    }
}

/// A shape anchored at a grid position (top-left corner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// Place `shape` at the spawn column on the top row.
    pub fn spawn(shape: Shape) -> Self {
        let x = spawn_column(&shape);
        Self { shape, x, y: 0 }
    }

    /// Absolute (x, y, colour) of every filled cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        self.shape
            .filled()
            .map(|(dx, dy, v)| (self.x + dx, self.y + dy, v))
    }

    /// Cell the hard-drop shockwave radiates from.
    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.shape.width() / 2) as i32,
            self.y + (self.shape.height() / 2) as i32,
        )
    }
}

pub fn spawn_column(shape: &Shape) -> i32 {
    (COLS / 2) as i32 - (shape.width() / 2) as i32
}

/// Settled cells. `rows[0]` is the top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    rows: VecDeque<[u8; COLS]>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: (0..ROWS).map(|_| [0; COLS]).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = value.min(MAX_COLOR);
        }
    }

    #[cfg(test)]
    pub fn row(&self, y: usize) -> Option<&[u8; COLS]> {
        self.rows.get(y)
    }

    /// True if any filled cell of `piece` is off the sides, below the floor,
    /// or (unless `ghost`) on top of a settled cell. Cells above the top row
    /// only collide with the side walls.
    pub fn collides(&self, piece: &Piece, ghost: bool) -> bool {
        piece.cells().any(|(x, y, _)| {
            if x < 0 || x >= COLS as i32 || y >= ROWS as i32 {
                return true;
            }
            !ghost && y >= 0 && self.rows[y as usize][x as usize] != 0
        })
    }

    /// Write the piece into the grid. Cells above the top row are dropped.
    pub fn merge(&mut self, piece: &Piece) {
        for (x, y, v) in piece.cells() {
            if x >= 0 && y >= 0 {
                self.set(x as usize, y as usize, v);
            }
        }
    }

    /// Row the piece would come to rest on if dropped straight down.
    pub fn landing_row(&self, piece: &Piece, ghost: bool) -> i32 {
        let mut probe = piece.clone();
        while !self.collides(&probe, ghost) {
            probe.y += 1;
        }
        probe.y - 1
    }

    /// Indices of rows with every cell occupied, top to bottom.
    pub fn full_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|&c| c != 0))
            .map(|(y, _)| y)
            .collect()
    }

    /// Remove the given rows (ascending) and pad with empty rows at the top.
    pub fn clear_rows(&mut self, rows: &[usize]) {
        for &y in rows {
            if y < ROWS {
                self.rows.remove(y);
                self.rows.push_front([0; COLS]);
            }
        }
    }

    /// Bottom-most row holding at least one settled cell.
    pub fn lowest_occupied_row(&self) -> Option<usize> {
        (0..ROWS)
            .rev()
            .find(|&y| self.rows[y].iter().any(|&c| c != 0))
    }

    /// Empty the occupied cells in the 3x3 square around (cx, cy).
    /// Returns how many cells were destroyed.
    pub fn blast(&mut self, cx: i32, cy: i32) -> u32 {
        let mut destroyed = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (x, y) = (cx + dx, cy + dy);
                if x < 0 || y < 0 || x >= COLS as i32 || y >= ROWS as i32 {
                    continue;
                }
                let cell = &mut self.rows[y as usize][x as usize];
                if *cell != 0 {
                    *cell = 0;
                    destroyed += 1;
                }
            }
        }
        destroyed
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(|&c| c == 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn filled_row(y: usize, board: &mut Board) {
        for x in 0..COLS {
            board.set(x, y, 3);
        }
    }

    #[test]
    fn rotating_four_times_restores_every_shape() {
        for i in 0..8 {
            let shape = Shape::catalogue(i);
            let back = shape.rotated().rotated().rotated().rotated();
            assert_eq!(back, shape);
        }
    }

    #[test]
    fn rotation_swaps_dimensions() {
        let bar = Shape::catalogue(0);
        let upright = bar.rotated();
        assert_eq!((upright.width(), upright.height()), (1, 4));
    }

    #[test]
    fn spawn_is_centered() {
        assert_eq!(Piece::spawn(Shape::catalogue(0)).x, 3);
        assert_eq!(Piece::spawn(Shape::catalogue(4)).x, 4);
        assert_eq!(Piece::spawn(Shape::catalogue(1)).x, 4);
    }

    #[test]
    fn walls_and_floor_collide() {
        let board = Board::new();
        let mut p = Piece::spawn(Shape::catalogue(4));
        assert!(!board.collides(&p, false));
        p.x = -1;
        assert!(board.collides(&p, false));
        p.x = COLS as i32 - 1;
        assert!(board.collides(&p, true));
        p.x = 0;
        p.y = ROWS as i32 - 1;
        assert!(board.collides(&p, true));
    }

    #[test]
    fn above_top_row_is_free() {
        let mut board = Board::new();
        board.set(4, 0, 1);
        let mut p = Piece::spawn(Shape::catalogue(4));
        p.y = -2;
        assert!(!board.collides(&p, false));
    }

    #[test]
    fn ghost_passes_through_settled_cells() {
        let mut board = Board::new();
        filled_row(10, &mut board);
        let mut p = Piece::spawn(Shape::catalogue(4));
        p.y = 9;
        assert!(board.collides(&p, false));
        assert!(!board.collides(&p, true));
        assert_eq!(board.landing_row(&Piece::spawn(Shape::catalogue(4)), true), 18);
        assert_eq!(board.landing_row(&Piece::spawn(Shape::catalogue(4)), false), 8);
    }

    #[test]
    fn clearing_keeps_rows_below_and_shifts_rows_above() {
        let mut board = Board::new();
        board.set(0, 17, 5);
        filled_row(18, &mut board);
        board.set(2, 19, 6);
        let full = board.full_rows();
        assert_eq!(full, vec![18]);
        board.clear_rows(&full);
        assert_eq!(board.get(0, 18), Some(5));
        assert_eq!(board.get(2, 19), Some(6));
        assert!(board.row(0).is_some_and(|r| r.iter().all(|&c| c == 0)));
    }

    #[test]
    fn clearing_two_separated_rows() {
        let mut board = Board::new();
        filled_row(15, &mut board);
        board.set(7, 16, 2);
        filled_row(17, &mut board);
        let full = board.full_rows();
        board.clear_rows(&full);
        assert_eq!(board.get(7, 17), Some(2));
        assert_eq!(board.lowest_occupied_row(), Some(17));
    }

    #[test]
    fn blast_is_clipped_to_grid() {
        let mut board = Board::new();
        board.set(0, 19, 1);
        board.set(1, 18, 1);
        board.set(2, 19, 1);
        assert_eq!(board.blast(0, 19), 2);
        assert_eq!(board.get(2, 19), Some(1));
        assert_eq!(board.blast(5, 5), 0);
    }

    #[test]
    fn set_clamps_colour_range() {
        let mut board = Board::new();
        board.set(0, 0, 200);
        assert_eq!(board.get(0, 0), Some(MAX_COLOR));
    }

    proptest! {
        #[test]
        fn collides_matches_cellwise_definition(
            cells in proptest::collection::vec((0usize..COLS, 0usize..ROWS), 0..60),
            shape_idx in 0usize..8,
            turns in 0usize..4,
            x in -4i32..(COLS as i32 + 2),
            y in -4i32..(ROWS as i32 + 2),
            ghost in any::<bool>(),
        ) {
            let mut board = Board::new();
            for (cx, cy) in &cells {
                board.set(*cx, *cy, 1);
            }
            let mut shape = Shape::catalogue(shape_idx);
            for _ in 0..turns {
                shape = shape.rotated();
            }
            let piece = Piece { shape, x, y };

            let expected = piece.cells().any(|(px, py, _)| {
                let out = px < 0 || px >= COLS as i32 || py >= ROWS as i32;
                let settled = py >= 0 && !out && board.get(px as usize, py as usize) != Some(0);
                out || (!ghost && settled)
            });
            prop_assert_eq!(board.collides(&piece, ghost), expected);
        }

        #[test]
        fn merged_cells_stay_in_colour_range(shape_idx in 0usize..8, x in 0i32..7, y in -2i32..17) {
            let mut board = Board::new();
            let piece = Piece { shape: Shape::catalogue(shape_idx), x, y };
            board.merge(&piece);
            for yy in 0..ROWS {
                for xx in 0..COLS {
                    prop_assert!(board.get(xx, yy).is_some_and(|c| c <= MAX_COLOR));
                }
            }
        }
    }
}
