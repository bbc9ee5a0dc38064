// TUI module - terminal renderer for the panel wall
//
// This module owns the terminal while the wall is shown. It handles:
// - Terminal initialization and cleanup
// - The frame loop (scene tick, input, redraw)
// - Translating keys, wheel and pointer motion into camera input

pub mod backend;
pub mod input;
pub mod panic_hook;
pub mod projection;
pub mod ui;

use crate::logging::LogBuffer;
use crate::nav::SystemClock;
use crate::scene::{Flow, Scene};
use crate::tail::Supervisor;
use anyhow::{Context, Result};
use backend::TerminalBackend;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use input::{InputHandler, MouseInput, PointerTracker};
use panic_hook::PanicHookGuard;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;
use ui::StatusInfo;

/// Run the wall until the user quits
///
/// The terminal is restored even when the loop fails or something panics.
pub async fn run_tui(
    scene: &mut Scene<TerminalBackend>,
    log_buffer: LogBuffer,
    tick_rate: Duration,
    supervisor: &Supervisor,
) -> Result<()> {
    // Set up terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
    let panic_guard = PanicHookGuard::install(release_terminal);

    let result = run_event_loop(&mut terminal, scene, &log_buffer, tick_rate, supervisor).await;
    drop(panic_guard);

    // Restore terminal
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to restore terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

/// Best effort, for a panic on the way out
fn release_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Frame loop
///
/// Each tick drains pending lines, advances the camera and redraws. Input
/// is handled between ticks so movement keys feel immediate.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    scene: &mut Scene<TerminalBackend>,
    log_buffer: &LogBuffer,
    tick_rate: Duration,
    supervisor: &Supervisor,
) -> Result<()> {
    let mut tick_interval = tokio::time::interval(tick_rate);
    tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut clock = SystemClock::new();
    let mut input = InputHandler::with_default_bindings();
    let mut pointer = PointerTracker::new();

    loop {
        tokio::select! {
            _ = tick_interval.tick() => {
                let report = scene.tick(&mut clock);
                if report.drained > 0 {
                    tracing::trace!(
                        "Tick applied {} lines to {} panels",
                        report.drained,
                        report.panels_updated
                    );
                }

                let status = scene.status();
                let last_log = log_buffer.latest();
                let info = StatusInfo {
                    scene: &status,
                    workers: supervisor.totals(),
                    last_log: last_log.as_ref(),
                };
                terminal
                    .draw(|f| ui::draw(f, scene.backend(), &info))
                    .context("Failed to draw terminal")?;
            }

            // Keyboard or mouse input
            input_event = async {
                if event::poll(Duration::from_millis(10)).unwrap_or(false) {
                    event::read().ok()
                } else {
                    None
                }
            } => {
                let flow = match input_event {
                    Some(Event::Key(key_event)) => handle_key_event(scene, &mut input, key_event),
                    Some(Event::Mouse(mouse_event)) => {
                        match pointer.handle(mouse_event, scene.mouse_look()) {
                            Some(MouseInput::Action(action)) => scene.dispatch(action, false),
                            Some(MouseInput::Look { dx, dy }) => {
                                scene.look(dx, dy);
                                Flow::Continue
                            }
                            None => Flow::Continue,
                        }
                    }
                    _ => Flow::Continue,
                };
                if flow == Flow::Quit {
                    tracing::info!("Quit requested");
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_key_event(
    scene: &mut Scene<TerminalBackend>,
    input: &mut InputHandler,
    key_event: KeyEvent,
) -> Flow {
    match key_event.kind {
        KeyEventKind::Press | KeyEventKind::Repeat => match input.handle_key(key_event) {
            Some(command) => scene.dispatch(command.action, command.boosted),
            None => Flow::Continue,
        },
        KeyEventKind::Release => {
            input.handle_key_release(key_event.code);
            Flow::Continue
        }
    }
}
