//! Normalized key identifiers
//!
//! A `KeyId` is an opaque token for one physical key. Names follow the DOM
//! `KeyboardEvent.key` convention so sequences read the same whether they come
//! from a terminal or a browser host.

use std::borrow::Cow;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde::{Deserialize, Serialize};

/// Normalized identifier for a single key press
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(Cow<'static, str>);

impl KeyId {
    pub const ARROW_UP: KeyId = KeyId::from_static("ArrowUp");
    pub const ARROW_DOWN: KeyId = KeyId::from_static("ArrowDown");
    pub const ARROW_LEFT: KeyId = KeyId::from_static("ArrowLeft");
    pub const ARROW_RIGHT: KeyId = KeyId::from_static("ArrowRight");

    /// Build an identifier from a static name without allocating
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Build an identifier from an owned name, taken verbatim
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Build the identifier for a printable character
    pub fn char(c: char) -> Self {
        Self::new(c.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for KeyId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

/// The classic Konami code: up up down down left right left right b a
pub fn konami_code() -> Vec<KeyId> {
    vec![
        KeyId::ARROW_UP,
        KeyId::ARROW_UP,
        KeyId::ARROW_DOWN,
        KeyId::ARROW_DOWN,
        KeyId::ARROW_LEFT,
        KeyId::ARROW_RIGHT,
        KeyId::ARROW_LEFT,
        KeyId::ARROW_RIGHT,
        KeyId::from_static("b"),
        KeyId::from_static("a"),
    ]
}

/// Normalize a terminal key event into a `KeyId`
///
/// Only presses are reported; repeats and releases yield `None`, as do keys
/// with no stable name.
pub fn normalize(event: &KeyEvent) -> Option<KeyId> {
    if event.kind != KeyEventKind::Press {
        return None;
    }

    let key = match event.code {
        KeyCode::Char(c) => KeyId::char(c),
        KeyCode::Up => KeyId::ARROW_UP,
        KeyCode::Down => KeyId::ARROW_DOWN,
        KeyCode::Left => KeyId::ARROW_LEFT,
        KeyCode::Right => KeyId::ARROW_RIGHT,
        KeyCode::Enter => KeyId::from_static("Enter"),
        KeyCode::Tab => KeyId::from_static("Tab"),
        KeyCode::BackTab => KeyId::from_static("Tab"),
        KeyCode::Backspace => KeyId::from_static("Backspace"),
        KeyCode::Delete => KeyId::from_static("Delete"),
        KeyCode::Esc => KeyId::from_static("Escape"),
        KeyCode::Home => KeyId::from_static("Home"),
        KeyCode::End => KeyId::from_static("End"),
        KeyCode::PageUp => KeyId::from_static("PageUp"),
        KeyCode::PageDown => KeyId::from_static("PageDown"),
        KeyCode::Insert => KeyId::from_static("Insert"),
        KeyCode::F(n) => KeyId::new(format!("F{n}")),
        _ => return None,
    };

    Some(key)
}

/// Check whether a key event is the terminal's interrupt chord
pub fn is_interrupt(event: &KeyEvent) -> bool {
    event.kind == KeyEventKind::Press
        && event.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(event.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_static_and_owned_are_equal() {
        assert_eq!(KeyId::from_static("ArrowUp"), KeyId::new("ArrowUp"));
        assert_eq!(KeyId::char('b'), KeyId::from("b"));
    }

    #[test]
    fn test_no_case_folding() {
        assert_ne!(KeyId::char('a'), KeyId::char('A'));
    }

    #[test]
    fn test_normalize_arrows_and_chars() {
        assert_eq!(normalize(&press(KeyCode::Up)), Some(KeyId::ARROW_UP));
        assert_eq!(normalize(&press(KeyCode::Right)), Some(KeyId::ARROW_RIGHT));
        assert_eq!(normalize(&press(KeyCode::Char('b'))), Some(KeyId::char('b')));
        assert_eq!(normalize(&press(KeyCode::F(5))), Some(KeyId::new("F5")));
        assert_eq!(normalize(&press(KeyCode::Null)), None);
    }

    #[test]
    fn test_normalize_ignores_release() {
        let mut event = press(KeyCode::Up);
        event.kind = KeyEventKind::Release;
        assert_eq!(normalize(&event), None);
    }

    #[test]
    fn test_interrupt_chord() {
        let mut event = press(KeyCode::Char('c'));
        assert!(!is_interrupt(&event));
        event.modifiers = KeyModifiers::CONTROL;
        assert!(is_interrupt(&event));
    }

    #[test]
    fn test_konami_code_shape() {
        let code = konami_code();
        assert_eq!(code.len(), 10);
        assert_eq!(code[0], KeyId::ARROW_UP);
        assert_eq!(code[9], KeyId::char('a'));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&KeyId::ARROW_LEFT).unwrap();
        assert_eq!(json, "\"ArrowLeft\"");
        let key: KeyId = serde_json::from_str("\"b\"").unwrap();
        assert_eq!(key, KeyId::char('b'));
    }
}
