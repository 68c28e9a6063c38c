//! Trigger module: detects a typed key sequence and flips the mode flag
//!
//! - `SequenceBuffer`: ring of the most recent keys
//! - `matcher`: rolling-window comparison against the target
//! - `TriggerController`: Waiting/Matched state machine owning the flag
//! - `Activation`: one controller plus one subscription, scoped to a subject

mod activation;
mod buffer;
mod controller;
pub mod matcher;

pub use activation::Activation;
pub use buffer::SequenceBuffer;
pub use controller::{TriggerController, TriggerState};
