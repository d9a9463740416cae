//! Terminal lifecycle management for quill.
//!
//! The TUI renders to stderr so stdout stays clean for shell pipelines. Logs go
//! to a file (see `main.rs`) because the terminal is owned by the UI.

use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::SIGTERM;
use signal_hook::flag::register;
use std::io::{stderr, BufWriter, Stderr};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};

/// CrosstermBackend over a buffered stderr writer.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stderr>>>;

/// Enables raw mode and enters the alternate screen. Call [`restore_tui`] at
/// every exit path.
///
/// Mouse capture and bracketed paste are switched on with the screen so pasted
/// text arrives as one `Event::Paste`.
///
/// # Errors
///
/// Returns `Err` if raw mode cannot be enabled, the escape sequences cannot be
/// written, or the backend fails to query the terminal size.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stderr());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Restores the terminal to its pre-TUI state. Idempotent.
///
/// ratatui 0.30 does not restore the terminal on `Drop`, so this must run on
/// every exit path including the panic hook.
///
/// # Errors
///
/// Returns `Err` if raw mode cannot be disabled or the escape sequences cannot
/// be written. The panic hook ignores the error.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stderr(), LeaveAlternateScreen, DisableMouseCapture, DisableBracketedPaste)?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before the panic message
/// prints. Must be called before [`init_tui`].
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_tui();
        tracing::error!(%panic_info, "panic");
        original_hook(panic_info);
    }));
}

/// Registers a SIGTERM handler that flips the returned flag.
///
/// The event loop polls the flag on its heartbeat and quits once it is set.
///
/// # Errors
///
/// Returns `Err` if the OS refuses to install the handler.
pub fn register_sigterm() -> std::io::Result<Arc<AtomicBool>> {
    let term = Arc::new(AtomicBool::new(false));
    register(SIGTERM, Arc::clone(&term))?;
    Ok(term)
}
