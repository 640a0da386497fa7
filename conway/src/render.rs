// render.rs - What the render loop hands to whatever draws the grids

use std::sync::Arc;

use crate::grid::Grid;

/// One rendered frame: the visible grids in window order plus the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFrame {
    pub grids: Vec<Arc<Grid>>,
    pub indices: Vec<usize>,
    pub iteration: u64,
    pub total_living_cells: usize,
    pub total_instances: usize,
    pub window_start: usize,
    pub paused: bool,
}

/// Output side of a run. Implementations only produce side effects.
pub trait Renderer: Send + Sync + 'static {
    fn render_window(&self, frame: WindowFrame);

    /// Board size the user asked for when starting a new game.
    fn grid_dimensions(&self) -> (usize, usize);

    fn display_controls(&self);

    /// Transient status line, e.g. the outcome of a save.
    fn display_message(&self, message: &str);
}
