// automaton.rs - One Game of Life board and its stepping logic

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use crate::error::DimensionMismatch;
use crate::grid::Grid;

pub const DEFAULT_ALIVE_PERCENT: u8 = 20;

/// Owns the current generation behind an `Arc`. Stepping builds the next
/// generation as a separate grid and only then swaps the pointer, so anyone
/// still holding the previous `Arc<Grid>` keeps a complete, unchanging copy.
#[derive(Debug, Clone)]
pub struct Automaton {
    rows: usize,
    columns: usize,
    grid: Arc<Grid>,
}

impl Automaton {
    /// All-dead automaton. Bounds on the dimensions are the caller's business.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns, grid: Arc::new(Grid::new(rows, columns)) }
    }

    /// Fresh automaton seeded from its own entropy-backed PRNG.
    pub fn random(rows: usize, columns: usize, alive_percent: u8) -> Self {
        let mut automaton = Self::new(rows, columns);
        automaton.randomize(alive_percent);
        automaton
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Re-seeds every cell. Each call draws a new seed, so separate automata diverge.
    pub fn randomize(&mut self, alive_percent: u8) {
        let mut rng = StdRng::from_entropy();
        self.randomize_with(alive_percent, &mut rng);
    }

    pub fn randomize_with<R: rand::Rng + ?Sized>(&mut self, alive_percent: u8, rng: &mut R) {
        self.grid = Arc::new(Grid::random(self.rows, self.columns, alive_percent, rng));
    }

    /// Advances one generation.
    pub fn step(&mut self) {
        let next = self.successor();
        self.grid = Arc::new(next);
    }

    /// The next generation, computed without touching the current one.
    pub fn successor(&self) -> Grid {
        self.grid.next_generation()
    }

    /// Installs an already computed successor. Only the registry's stepping
    /// task uses this, after computing the grid outside of any lock.
    pub(crate) fn install(&mut self, next: Grid) {
        debug_assert_eq!(next.dimensions(), self.dimensions());
        self.grid = Arc::new(next);
    }

    /// Shared handle to the current generation. No cells are copied.
    pub fn current_grid(&self) -> Arc<Grid> {
        Arc::clone(&self.grid)
    }

    /// Replaces the current generation, e.g. when resuming a save.
    pub fn set_grid(&mut self, grid: Grid) -> Result<(), DimensionMismatch> {
        if grid.dimensions() != self.dimensions() {
            return Err(DimensionMismatch { expected: self.dimensions(), found: grid.dimensions() });
        }
        self.grid = Arc::new(grid);
        Ok(())
    }

    pub fn count_living(&self) -> usize {
        self.grid.count_living()
    }
}
