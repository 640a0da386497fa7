// main.rs - Many Conway boards at once, stepped on a tokio runtime behind an egui window

use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use conway::automaton::DEFAULT_ALIVE_PERCENT;
use conway::config::{DEFAULT_SAVE_DIR, DEFAULT_TICK_MS, DEFAULT_WINDOW_WIDTH, MAX_INSTANCES, MAX_WINDOW_WIDTH};
use conway::{GameConfig, JsonStore, Persistence};
use eframe::egui;
use env_logger::Env;

mod ui;
mod view;

#[derive(Parser, Debug)]
#[command(name = "conway_coro", about = "Run up to 1000 Game of Life boards side by side")]
struct Cli {
    /// Number of boards in a parallel game [default: 1000]
    #[arg(long)]
    instances: Option<usize>,
    /// How many boards are on screen at once
    #[arg(long, default_value_t = DEFAULT_WINDOW_WIDTH, value_parser = parse_window)]
    window: usize,
    #[arg(long, default_value_t = 20)]
    rows: usize,
    #[arg(long, default_value_t = 20)]
    columns: usize,
    /// Milliseconds between generations
    #[arg(long = "tick-ms", default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,
    /// Chance of a cell starting alive, in percent
    #[arg(long, default_value_t = DEFAULT_ALIVE_PERCENT)]
    alive: u8,
    #[arg(long, default_value = DEFAULT_SAVE_DIR)]
    save_dir: PathBuf,
    /// Start a single game instead of a parallel one
    #[arg(long)]
    single: bool,
    /// Resume a save file from the save directory
    #[arg(long, value_name = "NAME")]
    load: Option<String>,
    /// Print the available saves and exit
    #[arg(long)]
    list_saves: bool,
}

fn parse_window(arg: &str) -> Result<usize, String> {
    let width: usize = arg.parse().map_err(|err| format!("{err}"))?;
    if !(1..=MAX_WINDOW_WIDTH).contains(&width) {
        return Err(format!("must be between 1 and {MAX_WINDOW_WIDTH}"));
    }
    Ok(width)
}

impl Cli {
    fn config(&self) -> GameConfig {
        let base = GameConfig {
            window_width: self.window,
            tick_interval_ms: self.tick_ms,
            alive_seed_percent: self.alive,
            save_dir: self.save_dir.clone(),
            ..GameConfig::default()
        };
        if self.single {
            GameConfig { instance_count: 1, window_width: 1, rows: self.rows, columns: self.columns, ..base }
        } else {
            GameConfig {
                instance_count: self.instances.unwrap_or(MAX_INSTANCES),
                rows: self.rows,
                columns: self.columns,
                ..base
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate()?;
    let store = JsonStore::new(&config.save_dir);

    if cli.list_saves {
        for (label, parallel) in [("single", false), ("parallel", true)] {
            println!("{label} saves:");
            for (i, name) in store.list_saves(parallel)?.iter().enumerate() {
                println!("{}. {name}", i + 1);
            }
        }
        return Ok(());
    }

    // a single save only joins a parallel run when a board count was asked for
    let pending = match &cli.load {
        Some(name) => Some(ui::prepare_load(&store, name, &config, cli.instances.is_some() && !cli.single)?),
        None => None,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 950.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Conway's Game of Life",
        options,
        Box::new(move |cc| Box::new(ui::GameOfLife::new(cc.egui_ctx.clone(), runtime, config, store, pending))),
    )
    .map_err(|err| anyhow!("window failed: {err}"))
}
