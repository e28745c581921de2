//! Application entry point for the growth mesh viewer.
//!
//! By default this opens an eframe/egui window and delegates all
//! interactive logic and rendering to [`Viewer`]. With `--headless` it runs
//! a batch of ticks without a window and only logs.
//!
//! # Usage
//!
//! ```bash
//! # Interactive window, 6-node jittered ring
//! growth_mesh_view
//!
//! # 5000 ticks without a window, progress every 500 ticks
//! growth_mesh_view --headless --ticks 5000 --report-every 500
//!
//! # Custom tunables
//! growth_mesh_view --config tuned.json --seed 42
//! ```

mod headless;
mod settings;
mod viewer;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mesh_core::config::Config;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use settings::Settings;
use viewer::Viewer;

/// Growth mesh viewer
#[derive(Parser, Debug)]
#[command(name = "growth_mesh_view")]
#[command(version, about = "Grow a self-subdividing spring ring", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Number of nodes in the initial ring
    #[arg(short, long, default_value_t = 6)]
    nodes: usize,

    /// JSON file overriding engine config fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the initial radius jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Start from a perfect circle
    #[arg(long)]
    no_jitter: bool,

    /// Run without a window and only log progress
    #[arg(long)]
    headless: bool,

    /// Number of ticks to run in headless mode
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// Headless progress interval in ticks (0 disables)
    #[arg(long, default_value_t = 100)]
    report_every: u64,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Parses the command line and starts either the window or a headless run.
///
/// ### Returns
/// - `Ok(())` if the run completes without errors.
/// - `Err` if the config cannot be loaded, the initial ring cannot be
///   built, or eframe fails to create the native window.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("could not use config {}", path.display()))?,
        None => Config::default(),
    };
    if cli.dump_config {
        println!("{}", cfg.to_json_string()?);
        return Ok(());
    }

    let settings = Settings {
        cfg,
        nodes: cli.nodes,
        jitter: !cli.no_jitter,
        seed: cli.seed,
    };

    if cli.headless {
        headless::run(&settings, cli.ticks, cli.report_every)?;
        return Ok(());
    }

    info!("growth_mesh_view v{}", env!("CARGO_PKG_VERSION"));
    let viewer = Viewer::new(settings)?;
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Growth Mesh",
        options,
        Box::new(move |_cc| Ok(Box::new(viewer))),
    )
    .map_err(|e| anyhow::anyhow!("viewer exited with an error: {e}"))
}
