//! Event bus for quill.
//!
//! User input, timer ticks and generation results are normalised into a single
//! `AppEvent` enum and sent over a tokio unbounded MPSC channel. The main loop
//! receives from this channel and dispatches accordingly.
//!
//! Two independent intervals drive the render and logic cycles:
//! - render interval (33 ms, about 30 FPS) triggers a `terminal.draw()` call;
//! - tick interval (250 ms) expires transient status messages.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind, MouseEvent};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::generation::types::GenerationEvent;

/// All events the application can receive from any source.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press (`KeyEventKind::Press` only; release and repeat are dropped).
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Bracketed paste into whichever input has focus.
    Paste(String),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    Tick,
    Render,
    /// Output from the generation worker thread.
    Generation(GenerationEvent),
    Quit,
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender is cloned into background tasks; the receiver is owned by the
/// main loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the tokio task that feeds terminal input and timers into the channel.
///
/// `reader.next().fuse()` keeps `select!` from polling a finished stream if
/// crossterm's reader ends. Send errors are ignored: once the receiver is gone
/// the process is shutting down.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut tick_interval = interval(Duration::from_millis(250));
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let tick_tick = tick_interval.tick();
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = tick_tick => {
                    let _ = tx.send(AppEvent::Tick);
                }
                _ = render_tick => {
                    let _ = tx.send(AppEvent::Render);
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => {
                            if key.kind == KeyEventKind::Press {
                                let _ = tx.send(AppEvent::Key(key));
                            }
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Ok(Event::Mouse(mouse))) => {
                            let _ = tx.send(AppEvent::Mouse(mouse));
                        }
                        Some(Ok(Event::Paste(text))) => {
                            let _ = tx.send(AppEvent::Paste(text));
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "terminal input error");
                        }
                        None => {
                            let _ = tx.send(AppEvent::Quit);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}
