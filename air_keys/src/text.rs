//! The typed-text buffer and how key presses change it.

use crate::key::KeyAction;
use crate::layout::Keyboard;

// ════════════════════════════════════════════════════════════════════════════
// TextBuffer
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
}

impl TextBuffer {
    pub fn new() -> Self { Self::default() }

    pub fn as_str(&self)   -> &str  { &self.text }
    pub fn len(&self)      -> usize { self.text.chars().count() }
    pub fn is_empty(&self) -> bool  { self.text.is_empty() }

    pub fn append(&mut self, s: &str) { self.text.push_str(s); }

    /// Drop the last character.  Empty buffers are left alone.
    pub fn delete_last(&mut self) { self.text.pop(); }

    pub fn clear(&mut self) { self.text.clear(); }
}

// ════════════════════════════════════════════════════════════════════════════
// Applying presses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// EXIT was pressed; later keys from the same frame were not applied.
    Exit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub outcome: Outcome,
    /// Labels of the keys that took effect, in order.
    pub typed:   Vec<String>,
}

/// Apply this frame's pressed keys (indices in layout order) to `buffer`.
pub fn apply_presses(buffer: &mut TextBuffer, keyboard: &Keyboard, pressed: &[usize]) -> Applied {
    let mut typed = Vec::new();
    for key in pressed.iter().filter_map(|&i| keyboard.key(i)) {
        typed.push(key.label().to_string());
        match key.action() {
            KeyAction::Exit    => return Applied { outcome: Outcome::Exit, typed },
            KeyAction::Delete  => buffer.delete_last(),
            KeyAction::Clear   => buffer.clear(),
            KeyAction::Char(s) => {
                buffer.append(s);
                log::debug!("text is now {:?}", buffer.as_str());
            }
        }
    }
    Applied { outcome: Outcome::Continue, typed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::layout::{build_keyboard, KeyboardGeometry, DEFAULT_ROWS};

    fn kb() -> Keyboard {
        build_keyboard(DEFAULT_ROWS, &KeyboardGeometry::default(), Duration::from_millis(400))
    }

    fn idx(kb: &Keyboard, label: &str) -> usize {
        kb.keys().iter().position(|k| k.label() == label).expect("label in layout")
    }

    #[test]
    fn append_append_delete() {
        let mut b = TextBuffer::new();
        b.append("A");
        b.append("B");
        b.delete_last();
        assert_eq!(b.as_str(), "A");
    }

    #[test]
    fn clear_empties() {
        let mut b = TextBuffer::new();
        b.append("HELLO");
        b.clear();
        assert_eq!(b.as_str(), "");
        assert!(b.is_empty());
    }

    #[test]
    fn delete_on_empty_is_noop() {
        let mut b = TextBuffer::new();
        b.delete_last();
        assert_eq!(b.as_str(), "");
    }

    #[test]
    fn delete_removes_whole_char() {
        let mut b = TextBuffer::new();
        b.append("é");
        b.delete_last();
        assert!(b.is_empty());
    }

    #[test]
    fn presses_apply_in_order() {
        let kb = kb();
        let mut b = TextBuffer::new();
        let pressed = [idx(&kb, "H"), idx(&kb, "I")];
        let out = apply_presses(&mut b, &kb, &pressed);
        assert_eq!(b.as_str(), "HI");
        assert_eq!(out.outcome, Outcome::Continue);
        assert_eq!(out.typed, vec!["H", "I"]);
    }

    #[test]
    fn special_keys_edit_buffer() {
        let kb = kb();
        let mut b = TextBuffer::new();
        b.append("HH");
        apply_presses(&mut b, &kb, &[idx(&kb, "DEL")]);
        assert_eq!(b.as_str(), "H");
        apply_presses(&mut b, &kb, &[idx(&kb, "CLEAR")]);
        assert_eq!(b.as_str(), "");
    }

    #[test]
    fn exit_stops_processing_the_frame() {
        let kb = kb();
        let mut b = TextBuffer::new();
        let pressed = [idx(&kb, "EXIT"), idx(&kb, "A")];
        let out = apply_presses(&mut b, &kb, &pressed);
        assert_eq!(out.outcome, Outcome::Exit);
        assert!(b.is_empty());
        assert_eq!(out.typed, vec!["EXIT"]);
    }
}
