//! Keyboard input: normalized key identifiers, the subscription contract,
//! and the terminal listener feeding it.

mod key;
mod listener;
mod source;

pub use key::{is_interrupt, konami_code, normalize, KeyId};
pub use listener::{forward_keys, ForwardExit, ListenerError, TerminalEvent, TerminalListener};
pub use source::{Disposer, KeyDispatcher, KeyEventSource, KeyHandler};
