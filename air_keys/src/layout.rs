//! Keyboard layout: a fixed grid of keys plus a detached EXIT key.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect, Size};
use crate::key::{Key, KeyAction, CLEAR_LABEL, DELETE_LABEL, EXIT_LABEL};

/// QWERTY letter rows followed by the special-key row.
pub const DEFAULT_ROWS: &[&[&str]] = &[
    &["Q", "W", "E", "R", "T", "Y", "U", "I", "O", "P"],
    &["A", "S", "D", "F", "G", "H", "J", "K", "L", ";"],
    &["Z", "X", "C", "V", "B", "N", "M", ",", ".", "/"],
    &[DELETE_LABEL, CLEAR_LABEL],
];

// ════════════════════════════════════════════════════════════════════════════
// KeyboardGeometry
// ════════════════════════════════════════════════════════════════════════════

/// Placement constants for [`build_keyboard`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardGeometry {
    pub key_size:     Size,
    /// Space between neighbouring keys, both axes.
    pub gap:          i32,
    /// Top-left corner of the first key in the grid.
    pub start:        Point,
    /// Distance of the EXIT key from the top and right canvas edges.
    pub exit_margin:  i32,
    pub canvas_width: i32,
}

impl Default for KeyboardGeometry {
    fn default() -> Self {
        KeyboardGeometry {
            key_size:     Size::new(75, 75),
            gap:          5,
            start:        Point::new(10, 40),
            exit_margin:  10,
            canvas_width: 1280,
        }
    }
}

impl KeyboardGeometry {
    /// Top-left corner of the key at `(row, col)`.
    pub fn cell(&self, row: usize, col: usize) -> Point {
        let step_x = self.key_size.width  + self.gap;
        let step_y = self.key_size.height + self.gap;
        Point::new(
            self.start.x + col as i32 * step_x,
            self.start.y + row as i32 * step_y,
        )
    }

    pub fn exit_origin(&self) -> Point {
        Point::new(
            self.canvas_width - self.key_size.width - self.exit_margin,
            self.exit_margin,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Keyboard
// ════════════════════════════════════════════════════════════════════════════

/// The ordered key collection.  Keys keep layout order for their whole
/// lifetime; only their click timestamps change.
#[derive(Clone, Debug)]
pub struct Keyboard {
    pub(crate) keys:        Vec<Key>,
    pub(crate) click_delay: Duration,
}

impl Keyboard {
    pub fn keys(&self)        -> &[Key]    { &self.keys }
    pub fn len(&self)         -> usize     { self.keys.len() }
    pub fn is_empty(&self)    -> bool      { self.keys.is_empty() }
    pub fn click_delay(&self) -> Duration  { self.click_delay }

    pub fn key(&self, index: usize) -> Option<&Key> { self.keys.get(index) }

    pub fn find(&self, label: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.label() == label)
    }

    /// The detached EXIT key, which the builder always appends last.
    pub fn exit_key(&self) -> Option<&Key> {
        self.keys.iter().rev().find(|k| *k.action() == KeyAction::Exit)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Builder
// ════════════════════════════════════════════════════════════════════════════

/// Lay out `rows` on a grid and append an EXIT key in the top-right corner.
///
/// Deterministic and infallible: empty rows simply contribute no keys.
pub fn build_keyboard<R, S>(rows: &[R], geometry: &KeyboardGeometry, click_delay: Duration) -> Keyboard
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut keys = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        for (c, label) in row.as_ref().iter().enumerate() {
            let bounds = Rect::new(geometry.cell(r, c), geometry.key_size);
            keys.push(Key::new(label.as_ref(), bounds));
        }
    }
    keys.push(Key::new(EXIT_LABEL, Rect::new(geometry.exit_origin(), geometry.key_size)));

    log::debug!("built keyboard with {} keys", keys.len());
    Keyboard { keys, click_delay }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
