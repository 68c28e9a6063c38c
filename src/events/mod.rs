//! Events emitted when the trigger's mode flag changes

use serde::{Deserialize, Serialize};

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerEvent {
    /// The target sequence was typed; mode flag is now on
    Unlocked {
        /// Keys observed by this controller so far
        keys_seen: u64,
    },

    /// A re-armed trigger matched again and switched the mode off
    Locked {
        /// Keys observed by this controller so far
        keys_seen: u64,
    },

    /// The caller reset the trigger
    Reset,
}

impl std::fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerEvent::Unlocked { keys_seen } => write!(f, "UNLOCKED (after {} keys)", keys_seen),
            TriggerEvent::Locked { keys_seen } => write!(f, "LOCKED (after {} keys)", keys_seen),
            TriggerEvent::Reset => write!(f, "RESET"),
        }
    }
}
