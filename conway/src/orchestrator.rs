// orchestrator.rs - Advance, render and input loops sharing one registry

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{info, trace, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::config::{GameConfig, check_window_width};
use crate::error::{ConfigError, DimensionMismatch, PersistenceError, Result};
use crate::input::{Command, InputSource};
use crate::persistence::{Persistence, SavedSet};
use crate::registry::{AggregateSnapshot, InstanceState, Registry};
use crate::render::{Renderer, WindowFrame};
use crate::window::VisibilityWindow;

/// `Idle -> Running <-> Paused -> Stopped`. Nothing leaves `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Stopped,
}

impl RunState {
    pub fn can_become(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Running) | (Running, Paused) | (Paused, Running) | (Idle | Running | Paused, Stopped)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Quit,
    ReturnToMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub aggregate: AggregateSnapshot,
}

/// How the instances of a run come into being.
#[derive(Debug, Clone)]
pub enum GameStart {
    New,
    /// A saved single game becomes instance 0; other instances start fresh.
    ResumeSingle(InstanceState),
    ResumeSet(SavedSet),
}

/// Builds the registry for a run. Saved grids must match the configured
/// rows/columns; a mismatch is returned and the game does not start.
pub fn build_registry(config: &GameConfig, start: GameStart) -> Result<Registry> {
    config.validate()?;
    let (rows, columns) = (config.rows, config.columns);
    let registry = match start {
        GameStart::New => Registry::fresh(config.instance_count, rows, columns, config.alive_seed_percent)?,
        GameStart::ResumeSingle(state) => {
            check_saved_dimensions(config, state.grid.dimensions())?;
            let grid = Arc::try_unwrap(state.grid).unwrap_or_else(|shared| (*shared).clone());
            Registry::from_seed(config.instance_count, rows, columns, config.alive_seed_percent, grid, state.iteration)?
        }
        GameStart::ResumeSet(set) => {
            check_saved_dimensions(config, (set.rows, set.columns))?;
            Registry::from_saved_set(config.instance_count, rows, columns, config.alive_seed_percent, set.instances)?
        }
    };
    Ok(registry)
}

fn check_saved_dimensions(config: &GameConfig, found: (usize, usize)) -> Result<(), DimensionMismatch> {
    let expected = (config.rows, config.columns);
    if found != expected {
        return Err(DimensionMismatch { expected, found });
    }
    Ok(())
}

struct Shared<R, P> {
    registry: Arc<Registry>,
    window: Mutex<VisibilityWindow>,  // panning and rendering never interleave
    renderer: Arc<R>,
    persistence: Arc<P>,
    state: Arc<watch::Sender<RunState>>,
    tick: Duration,
}

/// Stops a run from outside its input source, e.g. when the window closes.
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: Arc<watch::Sender<RunState>>,
}

impl StopHandle {
    pub fn stop(&self) {
        transition(&self.state, RunState::Stopped);
    }
}

pub struct Orchestrator<R, P> {
    shared: Arc<Shared<R, P>>,
}

impl<R: Renderer, P: Persistence> Orchestrator<R, P> {
    pub fn new(config: &GameConfig, registry: Registry, renderer: Arc<R>, persistence: Arc<P>) -> Result<Self, ConfigError> {
        check_window_width(config.window_width)?;
        if config.tick_interval_ms == 0 {
            return Err(ConfigError::TickInterval);
        }
        let window = VisibilityWindow::new(registry.len(), config.window_width);
        let (state, _) = watch::channel(RunState::Idle);
        Ok(Self {
            shared: Arc::new(Shared {
                registry: Arc::new(registry),
                window: Mutex::new(window),
                renderer,
                persistence,
                state: Arc::new(state),
                tick: config.tick(),
            }),
        })
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.shared.registry)
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.shared.state.subscribe()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { state: Arc::clone(&self.shared.state) }
    }

    /// Runs until a quit/menu command, the end of `input`, or a `StopHandle`.
    /// All three loops have finished by the time this returns.
    pub async fn run<I: InputSource>(self, input: I) -> RunReport {
        let shared = self.shared;
        if !transition(&shared.state, RunState::Running) {
            warn!("run started in state {:?}", *shared.state.borrow());
        }
        info!("running {} instances, tick {:?}", shared.registry.len(), shared.tick);
        shared.renderer.display_controls();
        shared.render();

        let advance = tokio::spawn(advance_loop(Arc::clone(&shared)));
        let render = tokio::spawn(render_loop(Arc::clone(&shared)));
        let input = tokio::spawn(input_loop(Arc::clone(&shared), input));

        let outcome = join(input).await.unwrap_or(RunOutcome::Quit);
        transition(&shared.state, RunState::Stopped);
        join(advance).await;
        join(render).await;

        let aggregate = shared.registry.aggregate();
        info!("stopped ({outcome:?}) at iteration {}", aggregate.max_iteration);
        RunReport { outcome, aggregate }
    }
}

impl<R: Renderer, P: Persistence> Shared<R, P> {
    fn paused(&self) -> bool {
        *self.state.borrow() == RunState::Paused
    }

    fn render(&self) {
        let window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        let indices = window.current().to_vec();
        let aggregate = self.registry.aggregate();
        let frame = WindowFrame {
            grids: self.registry.grids(&indices),
            indices,
            iteration: aggregate.max_iteration,
            total_living_cells: aggregate.total_living_cells,
            total_instances: aggregate.instance_count,
            window_start: window.first(),
            paused: self.paused(),
        };
        self.renderer.render_window(frame);
    }

    fn pan(&self, step: i64) {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.cycle(step);
    }

    fn page(&self) -> i64 {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).width() as i64
    }

    async fn save(&self) -> Result<String, PersistenceError> {
        let snapshot = self.registry.snapshot_all().await;
        let (rows, columns) = self.registry.dimensions();
        let persistence = Arc::clone(&self.persistence);
        let saved = tokio::task::spawn_blocking(move || match snapshot.as_slice() {
            [] => Err(PersistenceError::Empty),
            [single] => persistence.save_single(single),
            many => persistence.save_set(many, rows, columns),
        })
        .await;
        match saved {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(PersistenceError::Io { path: Default::default(), source: std::io::Error::other(err) }),
        }
    }
}

fn transition(state: &watch::Sender<RunState>, next: RunState) -> bool {
    state.send_if_modified(|current| {
        if current.can_become(next) {
            *current = next;
            true
        } else {
            false
        }
    })
}

async fn stopped(state: &mut watch::Receiver<RunState>) {
    // a dropped sender counts as stopped too
    let _ = state.wait_for(|s| *s == RunState::Stopped).await;
}

async fn join<T>(handle: JoinHandle<T>) -> Option<T> {
    match handle.await {
        Ok(value) => Some(value),
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        Err(_) => None,
    }
}

async fn advance_loop<R: Renderer, P: Persistence>(shared: Arc<Shared<R, P>>) {
    let mut state = shared.state.subscribe();
    let mut ticker = interval(shared.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;  // the first tick fires immediately

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stopped(&mut state) => break,
        }
        let current = *state.borrow();
        match current {
            RunState::Running => shared.registry.step_all().await,
            RunState::Stopped => break,
            RunState::Idle | RunState::Paused => {}
        }
    }
    trace!("advance loop done");
}

async fn render_loop<R: Renderer, P: Persistence>(shared: Arc<Shared<R, P>>) {
    let mut state = shared.state.subscribe();
    let mut ticker = interval(shared.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = stopped(&mut state) => break,
        }
        if *state.borrow() == RunState::Stopped {
            break;
        }
        shared.render();
    }
    trace!("render loop done");
}

async fn input_loop<R: Renderer, P: Persistence, I: InputSource>(shared: Arc<Shared<R, P>>, mut input: I) -> RunOutcome {
    let mut state = shared.state.subscribe();
    loop {
        let command = tokio::select! {
            command = input.next_command() => command,
            _ = stopped(&mut state) => return RunOutcome::Quit,
        };
        let Some(command) = command else {
            transition(&shared.state, RunState::Stopped);
            return RunOutcome::Quit;
        };
        trace!("command {command:?}");

        match command {
            Command::Quit => {
                transition(&shared.state, RunState::Stopped);
                return RunOutcome::Quit;
            }
            Command::Menu => {
                transition(&shared.state, RunState::Stopped);
                return RunOutcome::ReturnToMenu;
            }
            Command::Pause => {
                let next = if shared.paused() { RunState::Running } else { RunState::Paused };
                transition(&shared.state, next);
                shared.render();
            }
            Command::PanLeft => { shared.pan(-1); shared.render(); }
            Command::PanRight => { shared.pan(1); shared.render(); }
            Command::PageUp => { shared.pan(-shared.page()); shared.render(); }
            Command::PageDown => { shared.pan(shared.page()); shared.render(); }
            Command::Save => match shared.save().await {
                Ok(handle) => shared.renderer.display_message(&format!("Game saved: {handle}")),
                Err(err) => {
                    warn!("save failed: {err}");
                    shared.renderer.display_message(&format!("Error: {err}"));
                }
            },
            Command::Randomize => {
                shared.registry.randomize_all().await;
                shared.render();
            }
        }
    }
}
