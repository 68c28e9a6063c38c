//! Terminal key listener
//!
//! Captures key presses from the controlling terminal in raw mode and
//! forwards normalized keys to the host loop. Runs on a dedicated thread so
//! the trigger state itself never leaves the host thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::terminal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::key::{is_interrupt, normalize, KeyId};
use super::source::KeyDispatcher;

/// How long a poll waits before rechecking the running flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Events sent from the terminal listener to the host loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A normalized key press
    Key(KeyId),
    /// Ctrl+C was pressed (raw mode suppresses SIGINT)
    Interrupt,
}

/// Reads the terminal on its own thread until `stop()` is called
pub struct TerminalListener {
    event_tx: mpsc::Sender<TerminalEvent>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TerminalListener {
    /// Create a new terminal listener
    pub fn new(event_tx: mpsc::Sender<TerminalEvent>) -> Self {
        Self {
            event_tx,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    /// Enable raw mode and spawn the reader thread
    pub fn start(&self) -> Result<(), ListenerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ListenerError::AlreadyRunning);
        }

        if let Err(e) = terminal::enable_raw_mode() {
            self.running.store(false, Ordering::SeqCst);
            return Err(ListenerError::RawMode(e));
        }

        let event_tx = self.event_tx.clone();
        let running = Arc::clone(&self.running);

        let spawned = thread::Builder::new()
            .name("key-listener".to_string())
            .spawn(move || {
                info!("key listener thread started");

                run_event_loop(&event_tx, &running);

                running.store(false, Ordering::SeqCst);
                if let Err(e) = terminal::disable_raw_mode() {
                    warn!(?e, "failed to restore terminal mode");
                }
                info!("key listener thread stopped");
            });

        match spawned {
            Ok(handle) => {
                if let Ok(mut slot) = self.handle.lock() {
                    *slot = Some(handle);
                }
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = terminal::disable_raw_mode();
                Err(ListenerError::ThreadSpawn(e))
            }
        }
    }

    /// Stop the listener and wait for the terminal to be restored
    ///
    /// The thread notices within one poll interval. Drop the receiving end
    /// first so a pending send cannot keep it blocked.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);

        let handle = self.handle.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("key listener thread panicked");
            }
        }
    }

    /// Check if the listener is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Errors that can occur in the terminal listener
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("key listener is already running")]
    AlreadyRunning,

    #[error("failed to enable raw terminal mode: {0}")]
    RawMode(#[source] std::io::Error),

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

fn run_event_loop(event_tx: &mpsc::Sender<TerminalEvent>, running: &AtomicBool) {
    while running.load(Ordering::SeqCst) {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                error!(?e, "terminal poll failed");
                let _ = event_tx.blocking_send(TerminalEvent::Interrupt);
                break;
            }
        }

        let key_event = match event::read() {
            Ok(Event::Key(key_event)) => key_event,
            Ok(_) => continue,
            Err(e) => {
                warn!(?e, "terminal read failed");
                continue;
            }
        };

        let outgoing = if is_interrupt(&key_event) {
            TerminalEvent::Interrupt
        } else if let Some(key) = normalize(&key_event) {
            debug!(%key, "key pressed");
            TerminalEvent::Key(key)
        } else {
            continue;
        };

        if event_tx.blocking_send(outgoing).is_err() {
            warn!("failed to forward key - channel closed?");
            break;
        }
    }
}

/// Why `forward_keys` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardExit {
    /// An interrupt was received
    Interrupted,
    /// Every sender was dropped
    Closed,
}

/// Drain terminal events into a dispatcher, in arrival order
pub async fn forward_keys(
    rx: &mut mpsc::Receiver<TerminalEvent>,
    dispatcher: &KeyDispatcher,
) -> ForwardExit {
    while let Some(event) = rx.recv().await {
        match event {
            TerminalEvent::Key(key) => dispatcher.dispatch(&key),
            TerminalEvent::Interrupt => {
                info!("interrupt received from terminal");
                return ForwardExit::Interrupted;
            }
        }
    }

    ForwardExit::Closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::source::KeyEventSource;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listener_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let listener = TerminalListener::new(tx);
        assert!(!listener.is_running());
    }

    #[test]
    fn test_forward_keys_until_interrupt() {
        let (tx, mut rx) = mpsc::channel(8);
        let dispatcher = KeyDispatcher::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = dispatcher.subscribe(Box::new(move |key: &KeyId| {
            sink.borrow_mut().push(key.clone())
        }));

        tx.try_send(TerminalEvent::Key(KeyId::ARROW_UP)).unwrap();
        tx.try_send(TerminalEvent::Key(KeyId::char('a'))).unwrap();
        tx.try_send(TerminalEvent::Interrupt).unwrap();
        tx.try_send(TerminalEvent::Key(KeyId::char('z'))).unwrap();

        let exit = tokio_test::block_on(forward_keys(&mut rx, &dispatcher));
        assert_eq!(exit, ForwardExit::Interrupted);
        assert_eq!(*seen.borrow(), vec![KeyId::ARROW_UP, KeyId::char('a')]);
    }

    #[test]
    fn test_forward_keys_channel_closed() {
        let (tx, mut rx) = mpsc::channel(8);
        let dispatcher = KeyDispatcher::new();
        tx.try_send(TerminalEvent::Key(KeyId::ARROW_DOWN)).unwrap();
        drop(tx);

        let exit = tokio_test::block_on(forward_keys(&mut rx, &dispatcher));
        assert_eq!(exit, ForwardExit::Closed);
    }
}
