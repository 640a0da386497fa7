// error.rs - Error taxonomy for the simulation core

use std::path::PathBuf;
use thiserror::Error;

/// Rejected at construction; a run never starts with one of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("instance count {requested} must be between 1 and {max}")]
    InstanceCount { requested: usize, max: usize },
    #[error("grid {rows}x{columns} is outside the allowed {min}..={max} range")]
    GridSize { rows: usize, columns: usize, min: usize, max: usize },
    #[error("window width {0} must be between 1 and {max}", max = crate::config::MAX_WINDOW_WIDTH)]
    WindowWidth(usize),
    #[error("tick interval must be at least 1 ms")]
    TickInterval,
    #[error("alive seed percentage {0} exceeds 100")]
    AlivePercent(u8),
}

/// A grid whose size disagrees with the automaton it is loaded into.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[error("grid is {}x{} but {}x{} was expected", found.0, found.1, expected.0, expected.1)]
pub struct DimensionMismatch {
    pub expected: (usize, usize),
    pub found: (usize, usize),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save `{0}` not found")]
    NotFound(String),
    #[error("save `{name}` is corrupt: {reason}")]
    Corrupt { name: String, reason: String },
    #[error("i/o error on {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("nothing to save")]
    Empty,
}

impl PersistenceError {
    pub(crate) fn corrupt(name: &str, reason: impl ToString) -> Self {
        Self::Corrupt { name: name.to_string(), reason: reason.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum LifeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatch),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T, E = LifeError> = std::result::Result<T, E>;
