//! konami-trigger: terminal host for the key-sequence trigger
//!
//! Mounts one wrapped subject (a status line standing in for the page
//! layout), captures keys from the terminal and prints each mode change as a
//! JSON line on stdout. Logs go to stderr.
//!
//! Configuration:
//! - `KONAMI_SEQUENCE`: comma-separated key names (default: the Konami code)
//! - `KONAMI_RESET`: `sticky` (default) or `rearm`
//! - `RUST_LOG`: log filter (default: info)

use std::io::Write;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use konami_trigger::input::{forward_keys, TerminalListener};
use konami_trigger::lifecycle::ShutdownSignal;
use konami_trigger::{Activation, Config, KeyDispatcher, TriggerEvent};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "konami-trigger starting"
    );

    let config = Config::load().context("failed to load configuration")?;
    info!(sequence = %config.sequence, policy = %config.reset, "configuration loaded");

    let mut shutdown = ShutdownSignal::new().context("failed to register signal handlers")?;

    // Terminal listener -> dispatcher
    let (key_tx, mut key_rx) = mpsc::channel(32);
    // Trigger -> presentation
    let (event_tx, mut event_rx) = broadcast::channel::<TriggerEvent>(16);

    let dispatcher = KeyDispatcher::new();
    let subject = Activation::activate(&dispatcher, &config, event_tx);
    render(&subject, None);

    let listener = TerminalListener::new(key_tx);
    listener.start().context("failed to start key listener")?;

    info!("type the sequence; Ctrl+C to quit");

    tokio::select! {
        exit = forward_keys(&mut key_rx, &dispatcher) => {
            info!(?exit, "key stream ended");
        }

        _ = async {
            loop {
                match event_rx.recv().await {
                    Ok(event) => render(&subject, Some(&event)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "trigger event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        } => {
            info!("trigger event stream closed");
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    drop(key_rx);
    listener.stop();
    subject.deactivate();

    info!("konami-trigger stopped");

    Ok(())
}

/// Print the event (if any) and the subject's current mode
fn render(subject: &Activation, event: Option<&TriggerEvent>) {
    let mut out = std::io::stdout().lock();
    if let Err(e) = write_frame(&mut out, subject.is_unlocked(), event) {
        warn!(?e, "failed to render mode");
    }
}

/// Lines end in CRLF because the terminal is in raw mode
fn write_frame(out: &mut impl Write, unlocked: bool, event: Option<&TriggerEvent>) -> Result<()> {
    if let Some(event) = event {
        let json = serde_json::to_string(event)?;
        write!(out, "{json}\r\n")?;
    }
    let mode = if unlocked { "konami" } else { "default" };
    write!(out, "mode: {mode}\r\n")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_frame_with_event() {
        let mut out = Vec::new();
        let event = TriggerEvent::Unlocked { keys_seen: 10 };
        write_frame(&mut out, true, Some(&event)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"type\":\"unlocked\",\"keys_seen\":10}\r\nmode: konami\r\n"
        );
    }

    #[test]
    fn test_write_frame_status_only() {
        let mut out = Vec::new();
        write_frame(&mut out, false, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "mode: default\r\n");
    }
}
