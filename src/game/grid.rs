//! Topology of the 5×5 answer grid: addressable cells and winning lines.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Side length of the square grid.
pub const GRID_DIM: u8 = 5;

/// Letters labelling the grid rows, top to bottom.
const ROW_LABELS: [char; GRID_DIM as usize] = ['A', 'B', 'C', 'D', 'E'];

/// A single cell on the grid, addressed as a row letter plus a column
/// number (`A1` through `E5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    row: u8,
    col: u8,
}

/// Error produced when parsing a position label fails.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid grid position `{label}`: expected a letter A-E followed by a digit 1-5")]
pub struct ParsePositionError {
    /// The rejected input.
    pub label: String,
}

impl Position {
    /// Build a position from zero-based row and column indices.
    ///
    /// Returns `None` when either index falls outside the grid.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < GRID_DIM && col < GRID_DIM).then_some(Self { row, col })
    }

    /// Row letter of this cell (`A`..`E`).
    pub fn row_label(&self) -> char {
        ROW_LABELS[self.row as usize]
    }

    /// One-based column number of this cell (`1`..`5`).
    pub fn column_number(&self) -> u8 {
        self.col + 1
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_label(), self.column_number())
    }
}

impl FromStr for Position {
    type Err = ParsePositionError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let invalid = || ParsePositionError {
            label: label.to_owned(),
        };

        let mut chars = label.chars();
        let row_char = chars.next().ok_or_else(invalid)?;
        let col_char = chars.next().ok_or_else(invalid)?;
        if chars.next().is_some() {
            return Err(invalid());
        }

        let row = ROW_LABELS
            .iter()
            .position(|&r| r == row_char.to_ascii_uppercase())
            .ok_or_else(invalid)? as u8;
        let col = col_char.to_digit(10).filter(|&c| c >= 1).ok_or_else(invalid)?;

        Self::new(row, (col - 1) as u8).ok_or_else(invalid)
    }
}

/// All 25 grid positions in row-major order (`A1`, `A2`, ... `E5`).
pub fn all_positions() -> impl Iterator<Item = Position> {
    (0..GRID_DIM)
        .flat_map(|row| (0..GRID_DIM).map(move |col| Position { row, col }))
}

/// Positions not yet present in `filled`, in row-major order.
pub fn available_positions(filled: &HashSet<Position>) -> Vec<Position> {
    all_positions()
        .filter(|position| !filled.contains(position))
        .collect()
}

/// Count how many of the 12 winning lines (5 rows, 5 columns, 2 diagonals)
/// are entirely covered by `filled`.
///
/// A cell may contribute to several lines at once; there is no partial
/// credit for incomplete lines.
pub fn count_completed_lines(filled: &HashSet<Position>) -> u32 {
    let mut completed = 0;

    for row in 0..GRID_DIM {
        if (0..GRID_DIM).all(|col| filled.contains(&Position { row, col })) {
            completed += 1;
        }
    }

    for col in 0..GRID_DIM {
        if (0..GRID_DIM).all(|row| filled.contains(&Position { row, col })) {
            completed += 1;
        }
    }

    if (0..GRID_DIM).all(|i| filled.contains(&Position { row: i, col: i })) {
        completed += 1;
    }
    if (0..GRID_DIM).all(|i| {
        filled.contains(&Position {
            row: i,
            col: GRID_DIM - 1 - i,
        })
    }) {
        completed += 1;
    }

    completed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(labels: &[&str]) -> HashSet<Position> {
        labels.iter().map(|label| label.parse().unwrap()).collect()
    }

    #[test]
    fn all_positions_covers_the_grid_in_row_major_order() {
        let all: Vec<String> = all_positions().map(|p| p.to_string()).collect();
        assert_eq!(all.len(), 25);
        assert_eq!(all[0], "A1");
        assert_eq!(all[4], "A5");
        assert_eq!(all[5], "B1");
        assert_eq!(all[24], "E5");
    }

    #[test]
    fn parse_accepts_lowercase_and_round_trips() {
        let position: Position = "c3".parse().unwrap();
        assert_eq!(position.to_string(), "C3");
        for original in all_positions() {
            let reparsed: Position = original.to_string().parse().unwrap();
            assert_eq!(reparsed, original);
        }
    }

    #[test]
    fn parse_rejects_out_of_range_labels() {
        for label in ["", "A", "A0", "A6", "F1", "A12", "11", "AA"] {
            assert!(label.parse::<Position>().is_err(), "accepted `{label}`");
        }
    }

    #[test]
    fn empty_grid_has_no_lines() {
        assert_eq!(count_completed_lines(&HashSet::new()), 0);
    }

    #[test]
    fn a_full_row_counts_as_one_line() {
        let filled = positions(&["A1", "A2", "A3", "A4", "A5"]);
        assert_eq!(count_completed_lines(&filled), 1);
    }

    #[test]
    fn a_full_column_counts_as_one_line() {
        let filled = positions(&["A2", "B2", "C2", "D2", "E2"]);
        assert_eq!(count_completed_lines(&filled), 1);
    }

    #[test]
    fn both_diagonals_count() {
        let main = positions(&["A1", "B2", "C3", "D4", "E5"]);
        assert_eq!(count_completed_lines(&main), 1);

        let anti = positions(&["A5", "B4", "C3", "D2", "E1"]);
        assert_eq!(count_completed_lines(&anti), 1);
    }

    #[test]
    fn four_cells_of_a_row_do_not_count() {
        let filled = positions(&["B1", "B2", "B3", "B4"]);
        assert_eq!(count_completed_lines(&filled), 0);
    }

    #[test]
    fn full_board_completes_every_line() {
        let filled: HashSet<Position> = all_positions().collect();
        assert_eq!(count_completed_lines(&filled), 12);
    }

    #[test]
    fn overlapping_lines_all_count() {
        // Row C plus column 3 share the centre cell; both lines complete.
        let filled = positions(&[
            "C1", "C2", "C3", "C4", "C5", "A3", "B3", "D3", "E3",
        ]);
        assert_eq!(count_completed_lines(&filled), 2);
    }

    #[test]
    fn available_positions_excludes_filled_cells() {
        let filled = positions(&["A1", "E5"]);
        let available = available_positions(&filled);
        assert_eq!(available.len(), 23);
        assert!(!available.contains(&"A1".parse().unwrap()));
        assert!(!available.contains(&"E5".parse().unwrap()));
    }
}
