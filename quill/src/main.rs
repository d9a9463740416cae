//! quill: a terminal writing desk with an AI copilot.
//!
//! Entry point for the `quill` binary. Wires the terminal lifecycle (`tui`),
//! the event bus (`event`), the generation worker (`generation`) and the UI
//! (`ui`) around a `quill_core::SessionStore`.
//!
//! # Startup sequence
//!
//! 1. Load config, then start file logging under `.quill/`; the terminal is
//!    owned by the UI so nothing may log to it.
//! 2. `install_panic_hook()`, so a panic restores the terminal first.
//! 3. `register_sigterm()`, polled by the heartbeat arm of the loop.
//! 4. `init_tui()`, then the event task and the generation worker.
//!
//! The loop exits only through `break`, so `restore_tui()` always runs after it.

mod app;
mod config;
mod editor;
mod event;
mod generation;
mod theme;
mod tui;
mod ui;

use std::sync::atomic::Ordering;
use std::time::Duration;

use quill_core::detector::PlaceholderDetector;
use quill_core::generation::ScriptedGenerator;
use quill_core::SessionStore;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

use crate::event::AppEvent;
use crate::ui::keybindings::{self, KeyAction};

const LOG_DIR: &str = ".quill";

/// File logging through a non-blocking writer. Keep the guard alive until exit
/// or buffered lines are lost.
fn init_logging(level: &str) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(LOG_DIR)?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(LOG_DIR, "quill.log"));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let (config, config_err) = config::Config::load();
    let _log_guard = init_logging(&config.log.level)?;
    if let Some(e) = config_err {
        warn!(error = %e, path = %config::config_path().display(), "using default config");
    }
    info!(theme = %config.theme, persona = %config.writer.persona, "quill starting");

    let theme = theme::Theme::from_name(&config.theme);

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let generation_tx = match generation::worker::spawn_generation_worker(
        Box::new(ScriptedGenerator),
        config.stream.chunk_delay(),
        handler.tx.clone(),
    ) {
        Ok(tx) => Some(tx),
        Err(e) => {
            warn!(error = %e, "generation worker failed to start; copilot disabled");
            None
        }
    };

    let mut state = app::AppState::new(
        SessionStore::new(),
        config.writer.persona,
        config.writer.tone,
        Box::new(PlaceholderDetector),
        generation_tx,
    );

    // Draw errors are collected rather than returned with `?` so the terminal
    // is still restored below.
    let mut draw_result = Ok(());

    'event_loop: loop {
        tokio::select! {
            // Keeps SIGTERM checked while no other event arrives.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                let action = match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            draw_result = Err(e);
                            break 'event_loop;
                        }
                        KeyAction::Continue
                    }
                    Some(AppEvent::Key(key)) => keybindings::handle_key(key, &mut state),
                    Some(AppEvent::Mouse(mouse)) => keybindings::handle_mouse(mouse, &mut state),
                    Some(AppEvent::Paste(text)) => {
                        keybindings::handle_paste(&text, &mut state);
                        KeyAction::Continue
                    }
                    Some(AppEvent::Generation(ev)) => {
                        state.apply_generation_event(ev);
                        KeyAction::Continue
                    }
                    Some(AppEvent::Tick) => {
                        state.on_tick();
                        KeyAction::Continue
                    }
                    // ratatui picks up the new size from frame.area() on the next Render.
                    Some(AppEvent::Resize(_, _)) => KeyAction::Continue,
                    Some(AppEvent::Quit) | None => KeyAction::Quit,
                };
                state.sync_store_events();
                if action == KeyAction::Quit || term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    state.cancel_all();
    tui::restore_tui()?;
    info!("quill exiting");
    draw_result
}
