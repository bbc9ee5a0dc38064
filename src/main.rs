// logwall - follow many log files on one navigable wall
//
// Every file gets a panel on a single row; a camera glides between panels
// as focus moves, and can be flown freely.
//
// Architecture:
// - Tail: one follower thread per file, surviving rotation and truncation
// - Events: an unbounded channel carries lines from followers to the scene
// - Panel: bounded per-source line buffers laid out in world space
// - Nav: focus state machine plus the exponential camera smoother
// - Scene: per-frame drain, smooth and publish to a render backend
// - TUI (ratatui): the terminal render backend and frame loop

mod cli;
mod config;
mod events;
mod geometry;
mod logging;
mod nav;
mod panel;
mod scene;
mod startup;
mod tail;
mod tui;
mod util;

use anyhow::Result;
use cli::CliOutcome;
use config::Config;
use logging::LogBuffer;
use nav::{CameraSmoother, Navigator};
use panel::PanelStore;
use scene::{Scene, SceneSettings};
use tail::Supervisor;
use tui::backend::TerminalBackend;

#[tokio::main]
async fn main() -> Result<()> {
    // Subcommands (config --show, --reset, --path) exit early
    let args = match cli::handle_cli()? {
        CliOutcome::Handled => return Ok(()),
        CliOutcome::Run(args) => args,
    };

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();
    let config = Config::from_env()?;

    // The guard must outlive the frame loop so file logs flush
    let log_buffer = LogBuffer::new();
    let _file_guard = logging::init(&config.logging, log_buffer.clone());

    startup::print_startup(&config, &args);
    startup::log_startup(&args);
    config.report_repairs();

    let (tx, rx) = events::channel();

    let store = PanelStore::new(
        &args.files,
        &config.layout.panel_layout(),
        config.tail.panel_max_lines,
    );
    let navigator = Navigator::new(store.positions(), config.camera.focus_settings());
    let smoother = CameraSmoother::new(scene::initial_pose(), config.camera.lerp_speed);

    // Followers own their senders; the scene holds the only receiver
    let supervisor = Supervisor::spawn(&args.files, config.tail.poll_interval(), tx)?;

    let settings = SceneSettings {
        drain_batch: config.tail.drain_batch,
        move_speed: config.camera.move_speed,
        boost_speed: config.camera.boost_speed,
        move_step: config.ui.tick_rate(),
    };
    let backend = TerminalBackend::new(config.layout.panel_width, args.font.clone());
    let mut scene = Scene::new(store, navigator, smoother, rx, backend, settings);

    let result = tui::run_tui(&mut scene, log_buffer, config.ui.tick_rate(), &supervisor).await;

    let totals = supervisor.totals();
    supervisor.shutdown();
    tracing::info!(
        "Stopped: {} lines, {} rotations, {} truncations",
        totals.lines_sent,
        totals.rotations,
        totals.truncations
    );

    result
}
