// patterns.rs - Named starting patterns, stamped onto a grid at an offset

use crate::grid::Grid;

pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],  // (row, col) relative to the top-left corner
}

pub const BLOCK: Pattern = Pattern {
    name: "Block",
    cells: &[(0, 0), (0, 1), (1, 0), (1, 1)],
};

pub const BLINKER: Pattern = Pattern {
    name: "Blinker",
    cells: &[(0, 0), (0, 1), (0, 2)],
};

pub const TOAD: Pattern = Pattern {
    name: "Toad",
    cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
};

pub const BEACON: Pattern = Pattern {
    name: "Beacon",
    cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
};

pub const GLIDER: Pattern = Pattern {
    name: "Glider",
    cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
};

pub const R_PENTOMINO: Pattern = Pattern {
    name: "R-pentomino",
    cells: &[(0, 1), (0, 2), (1, 0), (1, 1), (2, 1)],
};

pub const PATTERNS: &[Pattern] = &[BLOCK, BLINKER, TOAD, BEACON, GLIDER, R_PENTOMINO];

impl Pattern {
    pub fn by_name(name: &str) -> Option<&'static Pattern> {
        PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Fresh grid holding only this pattern, top-left corner at (row, col).
    /// Cells landing outside the grid are clipped.
    pub fn stamp(&self, rows: usize, columns: usize, row: usize, col: usize) -> Grid {
        let mut grid = Grid::new(rows, columns);
        for &(r, c) in self.cells {
            grid.set(row + r, col + c, true);
        }
        grid
    }
}
