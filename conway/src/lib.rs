//! Many independent Game of Life boards stepped together on a tokio runtime,
//! with a pannable window onto a few of them and JSON save files.

pub mod automaton;
pub mod config;
pub mod error;
pub mod grid;
pub mod input;
pub mod orchestrator;
pub mod patterns;
pub mod persistence;
pub mod registry;
pub mod render;
pub mod window;

pub use automaton::Automaton;
pub use config::GameConfig;
pub use error::{ConfigError, DimensionMismatch, LifeError, PersistenceError};
pub use grid::Grid;
pub use input::{Command, InputSource};
pub use orchestrator::{GameStart, Orchestrator, RunOutcome, RunReport, RunState, StopHandle, build_registry};
pub use persistence::{JsonStore, Persistence, SavedSet};
pub use registry::{AggregateSnapshot, InstanceState, Registry};
pub use render::{Renderer, WindowFrame};
pub use window::VisibilityWindow;
