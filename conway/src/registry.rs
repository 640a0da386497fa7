// registry.rs - Fixed-size store of independently stepped automata

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, trace};
use tokio::sync::Mutex;

use crate::automaton::Automaton;
use crate::config::MAX_INSTANCES;
use crate::error::{ConfigError, Result};
use crate::grid::Grid;

/// (grid, iteration) pair as observed at one instant for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceState {
    pub grid: Arc<Grid>,
    pub iteration: u64,
}

/// Cross-instance numbers for status display. Recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateSnapshot {
    pub total_living_cells: usize,
    pub max_iteration: u64,
    pub instance_count: usize,
}

#[derive(Debug)]
struct Instance {
    automaton: Automaton,
    iteration: u64,
}

impl Instance {
    fn state(&self) -> InstanceState {
        InstanceState { grid: self.automaton.current_grid(), iteration: self.iteration }
    }
}

type Slot = RwLock<Instance>;

/// Owns N automata in a dense `[0, N)` index space.
///
/// Each slot has its own short-lived lock; the grid computation itself runs
/// outside of it, so point reads of any instance proceed while a step is in
/// flight. The step gate serialises `step_all` against `snapshot_all` and
/// `randomize_all`, which also makes the stepping task the only writer of a
/// slot at any time.
#[derive(Debug)]
pub struct Registry {
    rows: usize,
    columns: usize,
    alive_percent: u8,
    slots: Arc<[Slot]>,
    step_gate: Mutex<()>,
}

impl Registry {
    /// `count` freshly randomized instances, each at iteration 1.
    pub fn fresh(count: usize, rows: usize, columns: usize, alive_percent: u8) -> Result<Self, ConfigError> {
        check_count(count)?;
        let instances = (0..count).map(|_| random_instance(rows, columns, alive_percent)).collect();
        Ok(Self::from_instances(rows, columns, alive_percent, instances))
    }

    /// Instance 0 resumes `seed` at `seed_iteration`; the rest start fresh.
    pub fn from_seed(
        count: usize,
        rows: usize,
        columns: usize,
        alive_percent: u8,
        seed: Grid,
        seed_iteration: u64,
    ) -> Result<Self> {
        check_count(count)?;
        let mut automaton = Automaton::new(rows, columns);
        automaton.set_grid(seed)?;
        let mut instances = Vec::with_capacity(count);
        instances.push(Instance { automaton, iteration: seed_iteration });
        instances.extend((1..count).map(|_| random_instance(rows, columns, alive_percent)));
        Ok(Self::from_instances(rows, columns, alive_percent, instances))
    }

    /// One instance per saved entry, in order. When fewer than `capacity`
    /// entries are saved, the remainder is backfilled with fresh instances so
    /// a resumed run always reports `capacity` instances.
    pub fn from_saved_set(
        capacity: usize,
        rows: usize,
        columns: usize,
        alive_percent: u8,
        saved: Vec<InstanceState>,
    ) -> Result<Self> {
        check_count(capacity)?;
        if saved.len() > capacity {
            return Err(ConfigError::InstanceCount { requested: saved.len(), max: capacity }.into());
        }
        let mut instances = Vec::with_capacity(capacity);
        for state in saved {
            let mut automaton = Automaton::new(rows, columns);
            let grid = Arc::try_unwrap(state.grid).unwrap_or_else(|shared| (*shared).clone());
            automaton.set_grid(grid)?;
            instances.push(Instance { automaton, iteration: state.iteration });
        }
        let backfill = capacity - instances.len();
        instances.extend((0..backfill).map(|_| random_instance(rows, columns, alive_percent)));
        debug!("restored {} saved instances, backfilled {backfill}", capacity - backfill);
        Ok(Self::from_instances(rows, columns, alive_percent, instances))
    }

    fn from_instances(rows: usize, columns: usize, alive_percent: u8, instances: Vec<Instance>) -> Self {
        let slots: Vec<Slot> = instances.into_iter().map(RwLock::new).collect();
        Self { rows, columns, alive_percent, slots: slots.into(), step_gate: Mutex::new(()) }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Advances every instance by exactly one generation, one task per
    /// instance, and returns only once all of them have finished.
    ///
    /// Not cancel-safe: dropping the future early releases the step gate
    /// while instance tasks may still be running. Always drive it to completion.
    pub async fn step_all(&self) {
        let _gate = self.step_gate.lock().await;

        let mut handles = Vec::with_capacity(self.slots.len());
        for index in 0..self.slots.len() {
            let slots = Arc::clone(&self.slots);
            handles.push(tokio::spawn(async move { step_slot(&slots[index]) }));
        }

        for handle in handles {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }
        trace!("stepped {} instances", self.slots.len());
    }

    /// Point read. Returns generation n or n+1 for the index, never a mix.
    pub fn get(&self, index: usize) -> Option<InstanceState> {
        self.slots.get(index).map(|slot| read(slot).state())
    }

    /// Grids for the given indices, skipping any that are out of range.
    pub fn grids(&self, indices: &[usize]) -> Vec<Arc<Grid>> {
        indices.iter().filter_map(|&i| self.get(i)).map(|state| state.grid).collect()
    }

    /// Every instance as of one instant between bulk steps. Waits for any
    /// in-flight `step_all` to finish and holds the next one off until done.
    pub async fn snapshot_all(&self) -> Vec<InstanceState> {
        let _gate = self.step_gate.lock().await;
        self.slots.iter().map(|slot| read(slot).state()).collect()
    }

    /// Throws every instance away and starts over from fresh random grids at iteration 1.
    pub async fn randomize_all(&self) {
        let _gate = self.step_gate.lock().await;
        for slot in self.slots.iter() {
            *write(slot) = random_instance(self.rows, self.columns, self.alive_percent);
        }
        debug!("re-randomized {} instances", self.slots.len());
    }

    /// Display-only aggregate from point reads; may straddle a running step.
    pub fn aggregate(&self) -> AggregateSnapshot {
        let mut aggregate = AggregateSnapshot { instance_count: self.slots.len(), ..Default::default() };
        for slot in self.slots.iter() {
            let instance = read(slot);
            aggregate.total_living_cells += instance.automaton.count_living();
            aggregate.max_iteration = aggregate.max_iteration.max(instance.iteration);
        }
        aggregate
    }

    pub fn total_living_cells(&self) -> usize {
        self.aggregate().total_living_cells
    }

    pub fn max_iteration(&self) -> u64 {
        self.aggregate().max_iteration
    }
}

fn check_count(count: usize) -> Result<(), ConfigError> {
    if count == 0 || count > MAX_INSTANCES {
        return Err(ConfigError::InstanceCount { requested: count, max: MAX_INSTANCES });
    }
    Ok(())
}

fn random_instance(rows: usize, columns: usize, alive_percent: u8) -> Instance {
    Instance { automaton: Automaton::random(rows, columns, alive_percent), iteration: 1 }
}

fn step_slot(slot: &Slot) {
    let next = read(slot).automaton.successor();
    let mut instance = write(slot);
    instance.automaton.install(next);
    instance.iteration += 1;
}

fn read(slot: &Slot) -> RwLockReadGuard<'_, Instance> {
    slot.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(slot: &Slot) -> RwLockWriteGuard<'_, Instance> {
    slot.write().unwrap_or_else(PoisonError::into_inner)
}

