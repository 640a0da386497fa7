// config.rs - Run configuration passed explicitly into the orchestrator

use std::path::PathBuf;
use std::time::Duration;

use crate::automaton::DEFAULT_ALIVE_PERCENT;
use crate::error::ConfigError;

pub const MAX_INSTANCES: usize = 1000;
pub const MIN_GRID_SIZE: usize = 5;
pub const MAX_GRID_SIZE: usize = 30;
pub const MAX_WINDOW_WIDTH: usize = 8;
pub const DEFAULT_WINDOW_WIDTH: usize = MAX_WINDOW_WIDTH;
pub const DEFAULT_TICK_MS: u64 = 500;
pub const DEFAULT_SAVE_DIR: &str = "saves";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub instance_count: usize,
    pub window_width: usize,
    pub rows: usize,
    pub columns: usize,
    pub tick_interval_ms: u64,
    pub alive_seed_percent: u8,
    pub save_dir: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            instance_count: MAX_INSTANCES,
            window_width: DEFAULT_WINDOW_WIDTH,
            rows: 20,
            columns: 20,
            tick_interval_ms: DEFAULT_TICK_MS,
            alive_seed_percent: DEFAULT_ALIVE_PERCENT,
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
        }
    }
}

impl GameConfig {
    /// Single game: one instance shown through a one-wide window.
    pub fn single(rows: usize, columns: usize) -> Self {
        Self { instance_count: 1, window_width: 1, rows, columns, ..Self::default() }
    }

    pub fn parallel(instance_count: usize, rows: usize, columns: usize) -> Self {
        Self { instance_count, rows, columns, ..Self::default() }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_count == 0 || self.instance_count > MAX_INSTANCES {
            return Err(ConfigError::InstanceCount { requested: self.instance_count, max: MAX_INSTANCES });
        }
        check_dimensions(self.rows, self.columns)?;
        check_window_width(self.window_width)?;
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::TickInterval);
        }
        if self.alive_seed_percent > 100 {
            return Err(ConfigError::AlivePercent(self.alive_seed_percent));
        }
        Ok(())
    }
}

pub fn check_dimensions(rows: usize, columns: usize) -> Result<(), ConfigError> {
    let allowed = MIN_GRID_SIZE..=MAX_GRID_SIZE;
    if !allowed.contains(&rows) || !allowed.contains(&columns) {
        return Err(ConfigError::GridSize { rows, columns, min: MIN_GRID_SIZE, max: MAX_GRID_SIZE });
    }
    Ok(())
}

pub fn check_window_width(width: usize) -> Result<(), ConfigError> {
    if !(1..=MAX_WINDOW_WIDTH).contains(&width) {
        return Err(ConfigError::WindowWidth(width));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
        assert!(GameConfig::single(10, 10).validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let too_many = GameConfig { instance_count: MAX_INSTANCES + 1, ..GameConfig::default() };
        assert_eq!(
            too_many.validate(),
            Err(ConfigError::InstanceCount { requested: 1001, max: MAX_INSTANCES })
        );
        assert!(matches!(GameConfig::single(4, 10).validate(), Err(ConfigError::GridSize { .. })));
        assert!(matches!(GameConfig::single(10, 31).validate(), Err(ConfigError::GridSize { .. })));
        for width in [0, MAX_WINDOW_WIDTH + 1, 16] {
            let window = GameConfig { window_width: width, ..GameConfig::default() };
            assert_eq!(window.validate(), Err(ConfigError::WindowWidth(width)));
        }
        let widest = GameConfig { window_width: MAX_WINDOW_WIDTH, ..GameConfig::default() };
        assert!(widest.validate().is_ok());
        let odd_seed = GameConfig { alive_seed_percent: 101, ..GameConfig::default() };
        assert_eq!(odd_seed.validate(), Err(ConfigError::AlivePercent(101)));
    }
}
