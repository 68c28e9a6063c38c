//! Core trigger state machine
//!
//! Feeds each key into the rolling window and flips the mode flag when the
//! window equals the target sequence.

use std::fmt;

use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::config::{Config, ResetPolicy, TargetSequence};
use crate::events::TriggerEvent;
use crate::input::KeyId;

use super::buffer::SequenceBuffer;
use super::matcher::window_matches;

/// The two states of a trigger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriggerState {
    /// Collecting keys, no match yet (or re-armed)
    #[default]
    Waiting,
    /// Target sequence seen; further keys are ignored
    Matched,
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerState::Waiting => write!(f, "Waiting"),
            TriggerState::Matched => write!(f, "Matched"),
        }
    }
}

/// Owns the window, the target and the mode flag for one wrapped subject
pub struct TriggerController {
    target: TargetSequence,
    policy: ResetPolicy,
    buffer: SequenceBuffer,
    state: TriggerState,
    /// The mode flag exposed to the presentation layer
    unlocked: bool,
    keys_seen: u64,
    event_tx: broadcast::Sender<TriggerEvent>,
}

impl TriggerController {
    /// Create a controller in `Waiting` with the mode flag off
    pub fn new(config: &Config, event_tx: broadcast::Sender<TriggerEvent>) -> Self {
        Self {
            buffer: SequenceBuffer::with_capacity(config.sequence.len()),
            target: config.sequence.clone(),
            policy: config.reset,
            state: TriggerState::Waiting,
            unlocked: false,
            keys_seen: 0,
            event_tx,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Current mode flag
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn keys_seen(&self) -> u64 {
        self.keys_seen
    }

    pub fn policy(&self) -> ResetPolicy {
        self.policy
    }

    /// Contents of the rolling window, oldest first
    pub fn snapshot(&self) -> Vec<KeyId> {
        self.buffer.snapshot()
    }

    /// Process one key press; returns whether the mode flag changed
    pub fn on_key(&mut self, key: &KeyId) -> bool {
        if self.state == TriggerState::Matched {
            trace!(%key, "already matched, ignoring key");
            return false;
        }

        self.keys_seen += 1;
        self.buffer.push(key.clone());

        if !window_matches(&self.buffer, self.target.keys()) {
            return false;
        }

        // Residual keys must not seed an overlapping match
        self.buffer.clear();
        self.transition_to(TriggerState::Matched);

        let unlocked = match self.policy {
            ResetPolicy::Sticky => true,
            ResetPolicy::Rearm => !self.unlocked,
        };
        self.set_mode(unlocked);

        if self.policy == ResetPolicy::Rearm {
            self.transition_to(TriggerState::Waiting);
        }

        true
    }

    /// Return to `Waiting` with the mode flag off and an empty window
    pub fn reset(&mut self) {
        let was_unlocked = self.unlocked;

        self.buffer.clear();
        self.unlocked = false;
        if self.state != TriggerState::Waiting {
            self.transition_to(TriggerState::Waiting);
        }

        if was_unlocked {
            info!(keys_seen = self.keys_seen, "trigger reset");
            self.emit(TriggerEvent::Reset);
        }
    }

    /// Discard all progress without notifying anyone
    pub fn teardown(&mut self) {
        debug!(
            state = %self.state,
            buffered = self.buffer.len(),
            keys_seen = self.keys_seen,
            "trigger torn down"
        );
        self.buffer.clear();
        self.unlocked = false;
        self.state = TriggerState::Waiting;
    }

    fn set_mode(&mut self, unlocked: bool) {
        self.unlocked = unlocked;
        let event = if unlocked {
            TriggerEvent::Unlocked {
                keys_seen: self.keys_seen,
            }
        } else {
            TriggerEvent::Locked {
                keys_seen: self.keys_seen,
            }
        };

        info!(unlocked, keys_seen = self.keys_seen, "mode flag changed");
        self.emit(event);
    }

    fn transition_to(&mut self, new_state: TriggerState) {
        debug!(from = %self.state, to = %new_state, "state transition");
        self.state = new_state;
    }

    fn emit(&self, event: TriggerEvent) {
        debug!(?event, "emitting trigger event");
        // No receivers is fine; the flag is still readable
        let _ = self.event_tx.send(event);
    }
}

impl fmt::Debug for TriggerController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerController")
            .field("target", &self.target)
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("unlocked", &self.unlocked)
            .field("buffered", &self.buffer.len())
            .field("keys_seen", &self.keys_seen)
            .finish()
    }
}
