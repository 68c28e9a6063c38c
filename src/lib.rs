//! konami-trigger: easter-egg key sequence detection
//!
//! Watches a stream of normalized key presses and flips a single mode flag
//! when a configured sequence (by default the Konami code) is typed in a row.
//! Each wrapped subject gets its own `Activation`, which owns the trigger
//! state and releases its key subscription when dropped.

pub mod config;
pub mod events;
pub mod input;
pub mod lifecycle;
pub mod trigger;

pub use config::{Config, ConfigError, ResetPolicy, TargetSequence};
pub use events::TriggerEvent;
pub use input::{Disposer, KeyDispatcher, KeyEventSource, KeyId};
pub use trigger::{Activation, TriggerController, TriggerState};
