// persistence.rs - Save/load boundary and the JSON file store behind it

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::grid::Grid;
use crate::registry::InstanceState;

pub const SAVE_FILE_EXTENSION: &str = ".json";
pub const SINGLE_GAME_PREFIX: &str = "single_";
pub const PARALLEL_GAME_PREFIX: &str = "parallel_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of a stored save, usable with the `load_*` calls.
pub type SaveHandle = String;

/// A loaded multi-instance save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSet {
    pub instances: Vec<InstanceState>,
    pub rows: usize,
    pub columns: usize,
}

pub trait Persistence: Send + Sync + 'static {
    fn save_single(&self, state: &InstanceState) -> Result<SaveHandle, PersistenceError>;
    fn save_set(&self, states: &[InstanceState], rows: usize, columns: usize) -> Result<SaveHandle, PersistenceError>;
    /// Oldest first.
    fn list_saves(&self, parallel: bool) -> Result<Vec<String>, PersistenceError>;
    fn load_single(&self, name: &str) -> Result<InstanceState, PersistenceError>;
    fn load_set(&self, name: &str) -> Result<SavedSet, PersistenceError>;

    fn latest(&self, parallel: bool) -> Result<SaveHandle, PersistenceError> {
        self.list_saves(parallel)?
            .pop()
            .ok_or_else(|| PersistenceError::NotFound(if parallel { "parallel" } else { "single" }.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GameRecord {
    rows: usize,
    columns: usize,
    iteration: u64,
    #[serde(rename = "cells")]
    cells: Vec<Vec<bool>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SetRecord {
    games: Vec<GameRecord>,
    rows: usize,
    columns: usize,
}

impl GameRecord {
    fn from_state(state: &InstanceState) -> Self {
        Self {
            rows: state.grid.rows(),
            columns: state.grid.columns(),
            iteration: state.iteration,
            cells: state.grid.to_rows(),
        }
    }

    fn into_state(self, name: &str) -> Result<InstanceState, PersistenceError> {
        let grid = Grid::from_rows(&self.cells).ok_or_else(|| PersistenceError::corrupt(name, "ragged cell rows"))?;
        // an empty `cells` list parses as 0x0 regardless of the declared size
        if grid.rows() != self.rows || (self.rows > 0 && grid.columns() != self.columns) {
            return Err(PersistenceError::corrupt(
                name,
                format!("cells are {}x{} but header says {}x{}", grid.rows(), grid.columns(), self.rows, self.columns),
            ));
        }
        Ok(InstanceState { grid: Arc::new(grid), iteration: self.iteration })
    }
}

/// Pretty-printed JSON files in one directory, named
/// `single_save_<timestamp>.json` / `parallel_save_<timestamp>.json`.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write<T: Serialize>(&self, prefix: &str, record: &T) -> Result<SaveHandle, PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        let json = serde_json::to_string_pretty(record).map_err(|err| PersistenceError::corrupt(prefix, err))?;
        let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        let (mut file, name) = create_unused(&self.dir, &format!("{prefix}save_{stamp}"))?;
        let path = self.dir.join(&name);
        file.write_all(json.as_bytes()).map_err(|source| io_error(&path, source))?;
        info!("saved {}", path.display());
        Ok(name)
    }

    fn read(&self, name: &str) -> Result<String, PersistenceError> {
        // only plain file names inside the save directory can be loaded
        let mut parts = Path::new(name).components();
        let plain = matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None));
        if !plain || name.contains(['/', '\\']) {
            return Err(PersistenceError::NotFound(name.to_string()));
        }
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(json),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(PersistenceError::NotFound(name.to_string())),
            Err(source) => Err(io_error(&path, source)),
        }
    }
}

/// Creates `<base>.json`, or `<base>_N.json` for the first free `N`. The file
/// is opened with `create_new`, so an existing save is never truncated.
fn create_unused(dir: &Path, base: &str) -> Result<(File, String), PersistenceError> {
    let mut n = 0;
    loop {
        let name = match n {
            0 => format!("{base}{SAVE_FILE_EXTENSION}"),
            n => format!("{base}_{n}{SAVE_FILE_EXTENSION}"),
        };
        let path = dir.join(&name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, name)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(source) => return Err(io_error(&path, source)),
        }
    }
}

impl Persistence for JsonStore {
    fn save_single(&self, state: &InstanceState) -> Result<SaveHandle, PersistenceError> {
        self.write(SINGLE_GAME_PREFIX, &GameRecord::from_state(state))
    }

    fn save_set(&self, states: &[InstanceState], rows: usize, columns: usize) -> Result<SaveHandle, PersistenceError> {
        if states.is_empty() {
            return Err(PersistenceError::Empty);
        }
        let record = SetRecord { games: states.iter().map(GameRecord::from_state).collect(), rows, columns };
        self.write(PARALLEL_GAME_PREFIX, &record)
    }

    fn list_saves(&self, parallel: bool) -> Result<Vec<String>, PersistenceError> {
        let prefix = if parallel { PARALLEL_GAME_PREFIX } else { SINGLE_GAME_PREFIX };
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(io_error(&self.dir, source)),
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(prefix) && name.ends_with(SAVE_FILE_EXTENSION))
            .collect();
        // timestamps sort lexically; a collision suffix sorts after its base name
        names.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        Ok(names)
    }

    fn load_single(&self, name: &str) -> Result<InstanceState, PersistenceError> {
        let record: GameRecord =
            serde_json::from_str(&self.read(name)?).map_err(|err| PersistenceError::corrupt(name, err))?;
        record.into_state(name)
    }

    fn load_set(&self, name: &str) -> Result<SavedSet, PersistenceError> {
        let record: SetRecord =
            serde_json::from_str(&self.read(name)?).map_err(|err| PersistenceError::corrupt(name, err))?;
        let (rows, columns) = (record.rows, record.columns);
        let instances = record
            .games
            .into_iter()
            .map(|game| game.into_state(name))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(odd) = instances.iter().find(|state| state.grid.dimensions() != (rows, columns)) {
            let (r, c) = odd.grid.dimensions();
            return Err(PersistenceError::corrupt(name, format!("game is {r}x{c} in a {rows}x{columns} set")));
        }
        Ok(SavedSet { instances, rows, columns })
    }
}

fn sort_key(name: &str) -> (&str, usize) {
    let stem = name.trim_end_matches(SAVE_FILE_EXTENSION);
    // `<prefix>save_<date>_<time>[_<n>]`: three underscores before the optional suffix
    match stem.rsplit_once('_') {
        Some((base, n)) if stem.matches('_').count() > 3 => (base, n.parse().unwrap_or(0)),
        _ => (stem, 0),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io { path: path.to_path_buf(), source }
}
