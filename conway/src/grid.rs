// grid.rs - Immutable grid of cells for Conway's Game of Life

use rand::Rng;

/// Dense rows x columns board. Dimensions never change after creation and a
/// generation step always produces a fresh `Grid` instead of editing this one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<bool>,  // row-major
}

impl Grid {
    /// All-dead grid.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns, cells: vec![false; rows * columns] }
    }

    /// Builds a grid from nested rows. Returns `None` when the rows are ragged.
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let columns = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != columns) {
            return None;
        }
        Some(Self {
            rows: rows.len(),
            columns,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    /// Builds a grid with the listed (row, column) cells alive; out-of-range cells are ignored.
    pub fn with_cells(rows: usize, columns: usize, alive: &[(usize, usize)]) -> Self {
        let mut grid = Self::new(rows, columns);
        for &(row, col) in alive {
            grid.set(row, col, true);
        }
        grid
    }

    /// Every cell alive with probability `alive_percent` / 100.
    pub fn random<R: Rng + ?Sized>(rows: usize, columns: usize, alive_percent: u8, rng: &mut R) -> Self {
        let cells = (0..rows * columns)
            .map(|_| rng.gen_range(0..100u8) < alive_percent)
            .collect();
        Self { rows, columns, cells }
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn columns(&self) -> usize { self.columns }
    pub fn dimensions(&self) -> (usize, usize) { (self.rows, self.columns) }

    /// Out-of-bounds positions read as dead.
    pub fn is_alive(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.columns && self.cells[row * self.columns + col]
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, alive: bool) {
        if row < self.rows && col < self.columns {
            self.cells[row * self.columns + col] = alive;
        }
    }

    pub fn count_living(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Live neighbours among the 8 surrounding cells. No wraparound: edges and
    /// corners simply have fewer neighbours.
    pub fn live_neighbors(&self, row: usize, col: usize) -> u8 {
        let mut count = 0;
        for nr in row.saturating_sub(1)..=(row + 1).min(self.rows.saturating_sub(1)) {
            for nc in col.saturating_sub(1)..=(col + 1).min(self.columns.saturating_sub(1)) {
                if (nr, nc) != (row, col) && self.cells[nr * self.columns + nc] {
                    count += 1;
                }
            }
        }
        count
    }

    /// Generation n+1 as a new grid; `self` is left untouched.
    pub fn next_generation(&self) -> Grid {
        let mut cells = Vec::with_capacity(self.cells.len());
        for row in 0..self.rows {
            for col in 0..self.columns {
                let next_state = match (self.cells[row * self.columns + col], self.live_neighbors(row, col)) {
                    (true, 2) | (true, 3) => true,   // Survival
                    (false, 3)            => true,   // Birth
                    _                     => false,  // Death or stays dead
                };
                cells.push(next_state);
            }
        }
        Grid { rows: self.rows, columns: self.columns, cells }
    }

    /// Nested row-major copy, the shape used by the save files.
    pub fn to_rows(&self) -> Vec<Vec<bool>> {
        if self.columns == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells.chunks(self.columns).map(<[bool]>::to_vec).collect()
    }

    /// Iterator over the alive positions.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(i, _)| (i / self.columns, i % self.columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_cell_sees_only_three_neighbours() {
        let grid = Grid::with_cells(3, 3, &[(0, 1), (1, 0), (1, 1), (2, 2)]);
        assert_eq!(grid.live_neighbors(0, 0), 3);
        assert_eq!(grid.live_neighbors(2, 2), 1);
        assert_eq!(grid.live_neighbors(1, 1), 3);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        assert!(Grid::from_rows(&[vec![true, false], vec![true]]).is_none());
        let grid = Grid::from_rows(&[vec![true, false], vec![false, true]]).unwrap();
        assert_eq!(grid.dimensions(), (2, 2));
        assert_eq!(grid.to_rows(), vec![vec![true, false], vec![false, true]]);
    }

    #[test]
    fn out_of_bounds_reads_are_dead() {
        let grid = Grid::with_cells(2, 2, &[(1, 1), (5, 5)]);
        assert!(grid.is_alive(1, 1));
        assert!(!grid.is_alive(5, 5));
        assert_eq!(grid.count_living(), 1);
    }
}
