// ui.rs - Launcher and running-game screens for the egui window

use std::sync::Arc;
use std::time::Duration;

use conway::config::{MAX_GRID_SIZE, MAX_INSTANCES, MAX_WINDOW_WIDTH, MIN_GRID_SIZE};
use conway::persistence::PARALLEL_GAME_PREFIX;
use conway::{
    Command, GameConfig, GameStart, JsonStore, LifeError, Orchestrator, Persistence, Renderer, RunOutcome, RunReport,
    RunState, StopHandle, WindowFrame, build_registry,
};
use eframe::egui;
use egui::{Color32, Rect, Stroke, Vec2};
use log::{error, info};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::view::FrameView;

// a stopped run stops rendering, so `update` polls for its task to finish
const REAP_POLL: Duration = Duration::from_millis(50);

/// Reads a save and turns it into a start request. The board size comes from
/// the save itself; a single save joins a parallel run only when asked to.
pub fn prepare_load(
    store: &JsonStore,
    name: &str,
    base: &GameConfig,
    into_parallel: bool,
) -> Result<(GameConfig, GameStart), LifeError> {
    if name.starts_with(PARALLEL_GAME_PREFIX) {
        let set = store.load_set(name)?;
        let config = GameConfig {
            instance_count: base.instance_count.max(set.instances.len()),
            window_width: base.window_width.max(1),
            rows: set.rows,
            columns: set.columns,
            ..base.clone()
        };
        info!("loading {name}: {} saved boards", set.instances.len());
        Ok((config, GameStart::ResumeSet(set)))
    } else {
        let state = store.load_single(name)?;
        let (rows, columns) = state.grid.dimensions();
        let config = if into_parallel {
            GameConfig { rows, columns, ..base.clone() }
        } else {
            with_run_settings(GameConfig::single(rows, columns), base)
        };
        info!("loading {name} at iteration {}", state.iteration);
        Ok((config, GameStart::ResumeSingle(state)))
    }
}

/// `config` with tick, seed and save directory taken from `base`.
fn with_run_settings(config: GameConfig, base: &GameConfig) -> GameConfig {
    GameConfig {
        tick_interval_ms: base.tick_interval_ms,
        alive_seed_percent: base.alive_seed_percent,
        save_dir: base.save_dir.clone(),
        ..config
    }
}

struct Session {
    view: Arc<FrameView>,
    commands: mpsc::UnboundedSender<Command>,
    stop: StopHandle,
    state: watch::Receiver<RunState>,
    task: Option<JoinHandle<RunReport>>,
}

impl Session {
    fn send(&self, command: Command) {
        // the run may already be over; the next repaint notices
        let _ = self.commands.send(command);
    }

    /// Stopped, but the run's report has not been picked up yet.
    fn awaiting_reap(&self) -> bool {
        self.task.is_some() && *self.state.borrow() == RunState::Stopped
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

enum Screen {
    Launcher,
    Running(Session),
}

pub struct GameOfLife {
    ctx: egui::Context,
    runtime: Runtime,
    store: Arc<JsonStore>,
    base: GameConfig,
    screen: Screen,

    // launcher fields
    single_saves: Vec<String>,
    parallel_saves: Vec<String>,
    selected_single: usize,
    selected_parallel: usize,
    launcher_message: Option<String>,

    pub live_color: Color32,
    pub dead_color: Color32,
}

impl GameOfLife {
    pub fn new(
        ctx: egui::Context,
        runtime: Runtime,
        base: GameConfig,
        store: JsonStore,
        pending: Option<(GameConfig, GameStart)>,
    ) -> Self {
        let mut app = Self {
            ctx,
            runtime,
            store: Arc::new(store),
            base,
            screen: Screen::Launcher,
            single_saves: Vec::new(),
            parallel_saves: Vec::new(),
            selected_single: 0,
            selected_parallel: 0,
            launcher_message: None,
            live_color: Color32::from_rgb(0, 200, 0),
            dead_color: Color32::from_rgb(40, 40, 40),
        };
        app.refresh_saves();
        if let Some((config, start)) = pending {
            app.start(config, start);
        }
        app
    }

    fn refresh_saves(&mut self) {
        let list = |parallel| self.store.list_saves(parallel).unwrap_or_else(|err| {
            error!("listing saves failed: {err}");
            Vec::new()
        });
        self.single_saves = list(false);
        self.parallel_saves = list(true);
        self.selected_single = self.single_saves.len().saturating_sub(1);
        self.selected_parallel = self.parallel_saves.len().saturating_sub(1);
    }

    fn start(&mut self, config: GameConfig, start: GameStart) {
        let registry = match build_registry(&config, start) {
            Ok(registry) => registry,
            Err(err) => {
                self.launcher_message = Some(format!("Error: {err}"));
                return;
            }
        };
        let view = Arc::new(FrameView::new(self.ctx.clone(), (config.rows, config.columns)));
        let orchestrator = match Orchestrator::new(&config, registry, Arc::clone(&view), Arc::clone(&self.store)) {
            Ok(orchestrator) => orchestrator,
            Err(err) => {
                self.launcher_message = Some(format!("Error: {err}"));
                return;
            }
        };
        let stop = orchestrator.stop_handle();
        let state = orchestrator.subscribe();
        let (commands, input) = mpsc::unbounded_channel();
        let task = self.runtime.spawn(orchestrator.run(input));
        self.launcher_message = None;
        self.screen = Screen::Running(Session { view, commands, stop, state, task: Some(task) });
    }

    fn load(&mut self, name: &str) {
        match prepare_load(&self.store, name, &self.base, false) {
            Ok((config, start)) => self.start(config, start),
            Err(err) => self.launcher_message = Some(format!("Error: {err}")),
        }
    }

    /// Picks up a finished run: back to the launcher on menu, close on quit.
    fn reap_finished_run(&mut self, ctx: &egui::Context) {
        let Screen::Running(session) = &mut self.screen else { return };
        let Some(task) = session.task.take_if(|task| task.is_finished()) else { return };

        match self.runtime.block_on(task) {
            Ok(RunReport { outcome: RunOutcome::ReturnToMenu, .. }) => {
                self.screen = Screen::Launcher;
                self.refresh_saves();
            }
            Ok(RunReport { outcome: RunOutcome::Quit, .. }) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Err(err) => {
                error!("run ended abnormally: {err}");
                self.screen = Screen::Launcher;
                self.launcher_message = Some(format!("Error: {err}"));
            }
        }
    }

    fn launcher(&mut self, ui: &mut egui::Ui) {
        ui.heading("Conway's Game of Life");
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Rows:");
            ui.add(egui::DragValue::new(&mut self.base.rows).clamp_range(MIN_GRID_SIZE..=MAX_GRID_SIZE));
            ui.label("Columns:");
            ui.add(egui::DragValue::new(&mut self.base.columns).clamp_range(MIN_GRID_SIZE..=MAX_GRID_SIZE));
            ui.separator();
            ui.label("Boards:");
            ui.add(egui::DragValue::new(&mut self.base.instance_count).clamp_range(1..=MAX_INSTANCES));
            ui.label("On screen:");
            ui.add(egui::DragValue::new(&mut self.base.window_width).clamp_range(1..=MAX_WINDOW_WIDTH));
        });

        ui.horizontal(|ui| {
            if ui.button("▶ New game").clicked() {
                let config = with_run_settings(GameConfig::single(self.base.rows, self.base.columns), &self.base);
                self.start(config, GameStart::New);
            }
            if ui.button("▶ New parallel game").clicked() {
                self.start(self.base.clone(), GameStart::New);
            }
        });

        ui.separator();

        let mut chosen = None;
        for (label, id, saves, selected) in [
            ("Single saves:", "single_saves", &self.single_saves, &mut self.selected_single),
            ("Parallel saves:", "parallel_saves", &self.parallel_saves, &mut self.selected_parallel),
        ] {
            ui.horizontal(|ui| {
                ui.label(label);
                if saves.is_empty() {
                    ui.label("none");
                    return;
                }
                egui::ComboBox::from_id_source(id)
                    .selected_text(saves.get(*selected).map_or("", String::as_str))
                    .show_ui(ui, |ui| {
                        for (i, name) in saves.iter().enumerate() {
                            ui.selectable_value(&mut *selected, i, name.as_str());
                        }
                    });
                if ui.button("Load").clicked() {
                    chosen = saves.get(*selected).cloned();
                }
            });
        }
        if let Some(name) = chosen {
            self.load(&name);
        }

        if let Some(message) = &self.launcher_message {
            ui.separator();
            ui.colored_label(Color32::LIGHT_RED, message);
        }
    }

    fn running(&mut self, ui: &mut egui::Ui) {
        let Screen::Running(session) = &self.screen else { return };

        let commands = ui.input(|i| {
            [
                (egui::Key::Q, Command::Quit),
                (egui::Key::M, Command::Menu),
                (egui::Key::S, Command::Save),
                (egui::Key::Space, Command::Pause),
                (egui::Key::R, Command::Randomize),
                (egui::Key::ArrowLeft, Command::PanLeft),
                (egui::Key::ArrowRight, Command::PanRight),
                (egui::Key::ArrowUp, Command::PageUp),
                (egui::Key::ArrowDown, Command::PageDown),
            ]
            .into_iter()
            .filter(|(key, _)| i.key_pressed(*key))
            .map(|(_, command)| command)
            .collect::<Vec<_>>()
        });
        for command in commands {
            session.send(command);
        }

        let frame = session.view.latest();
        let paused = frame.as_ref().is_some_and(|f| f.paused);

        if session.view.show_controls() {
            ui.horizontal(|ui| {
                let pause_text = if paused { "▶ Resume" } else { "⏸ Pause" };
                for (text, command) in [
                    (pause_text, Command::Pause),
                    ("💾 Save", Command::Save),
                    ("🎲 Random", Command::Randomize),
                    ("⏪", Command::PageUp),
                    ("◀", Command::PanLeft),
                    ("▶", Command::PanRight),
                    ("⏩", Command::PageDown),
                    ("Menu", Command::Menu),
                    ("Quit", Command::Quit),
                ] {
                    if ui.button(text).clicked() {
                        session.send(command);
                    }
                }
                ui.separator();
                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);
            });
            ui.label("Keys: Space pause, S save, R randomize, ←/→ pan, ↑/↓ page, M menu, Q quit");
            ui.separator();
        }

        let Some(frame) = frame else {
            ui.label("Starting...");
            return;
        };

        status_line(ui, &frame, session.view.grid_dimensions());
        if let Some(message) = session.view.message() {
            ui.label(message);
        }
        ui.separator();

        draw_boards(ui, &frame, self.live_color, self.dead_color);
    }
}

fn status_line(ui: &mut egui::Ui, frame: &WindowFrame, (rows, columns): (usize, usize)) {
    ui.horizontal(|ui| {
        ui.label(format!("Generation: {}", frame.iteration));
        ui.separator();
        ui.label(format!("Live cells: {}", frame.total_living_cells));
        ui.separator();
        ui.label(format!("Boards: {} ({rows}x{columns})", frame.total_instances));
        ui.separator();
        let last = frame.indices.last().map_or(0, |i| i + 1);
        ui.label(format!("Showing {} to {last}", frame.window_start + 1));
        if frame.paused {
            ui.separator();
            ui.label("PAUSED");
        }
    });
}

/// Visible boards side by side, wrapping onto further rows when narrow.
fn draw_boards(ui: &mut egui::Ui, frame: &WindowFrame, live_color: Color32, dead_color: Color32) {
    let spacing = 0.5;
    let gap = 16.0;
    let count = frame.grids.len().max(1) as f32;
    let columns = frame.grids.first().map_or(1, |g| g.columns().max(1)) as f32;
    let box_size = ((ui.available_width() - gap * count) / (count * columns) - spacing).clamp(3.0, 15.0);

    ui.horizontal_wrapped(|ui| {
        for (grid, index) in frame.grids.iter().zip(&frame.indices) {
            ui.vertical(|ui| {
                ui.label(format!("#{}", index + 1));

                let size = Vec2::new(
                    (box_size + spacing) * grid.columns() as f32 - spacing,
                    (box_size + spacing) * grid.rows() as f32 - spacing,
                );
                let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
                let start_pos = response.rect.min;

                painter.rect_filled(Rect::from_min_size(start_pos, size), 0.0, Color32::BLACK);

                for row in 0..grid.rows() {
                    for col in 0..grid.columns() {
                        let x = start_pos.x + col as f32 * (box_size + spacing);
                        let y = start_pos.y + row as f32 * (box_size + spacing);
                        let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));

                        let cell_color = if grid.is_alive(row, col) { live_color } else { dead_color };
                        painter.rect_filled(rect, 1.0, cell_color);
                        painter.rect_stroke(rect, 1.0, Stroke::new(0.2, Color32::from_gray(60)));
                    }
                }
            });
            ui.add_space(gap);
        }
    });
}

impl eframe::App for GameOfLife {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.reap_finished_run(ctx);
        if matches!(&self.screen, Screen::Running(session) if session.awaiting_reap()) {
            ctx.request_repaint_after(REAP_POLL);
        }

        let on_launcher = matches!(self.screen, Screen::Launcher);
        egui::CentralPanel::default().show(ctx, |ui| {
            if on_launcher {
                self.launcher(ui);
            } else {
                egui::ScrollArea::vertical().show(ui, |ui| self.running(ui));
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use super::*;

    fn wait_until(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..400 {
            if check() {
                return true;
            }
            sleep(Duration::from_millis(5));
        }
        false
    }

    fn session(app: &GameOfLife) -> &Session {
        match &app.screen {
            Screen::Running(session) => session,
            Screen::Launcher => panic!("no run in progress"),
        }
    }

    #[test]
    fn menu_returns_to_the_launcher_without_further_input() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let base = GameConfig {
            instance_count: 6,
            window_width: 3,
            rows: 6,
            columns: 6,
            tick_interval_ms: 5,
            save_dir: dir.path().to_path_buf(),
            ..GameConfig::default()
        };
        let pending = Some((base.clone(), GameStart::New));
        let mut app = GameOfLife::new(ctx.clone(), Runtime::new().unwrap(), base, JsonStore::new(dir.path()), pending);

        assert!(!session(&app).awaiting_reap());
        session(&app).send(Command::Menu);
        assert!(wait_until(|| session(&app).awaiting_reap()), "run never stopped");

        assert!(wait_until(|| {
            app.reap_finished_run(&ctx);
            matches!(app.screen, Screen::Launcher)
        }));
    }
}
