//! Per-frame mapping from detected hands to debounced key presses.
//!
//! Every key is tested against the cursor on every frame.  With roughly
//! forty keys a linear scan is all this needs; there is no spatial index.

use std::time::Duration;

use crate::hand::{select_cursor, Cursor, CursorPolicy, Hand};
use crate::layout::Keyboard;

/// What one frame produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameEvents {
    pub cursor:  Option<Cursor>,
    /// Indices into [`Keyboard::keys`] of keys that accepted a click, in
    /// layout order.
    pub pressed: Vec<usize>,
}

impl Keyboard {
    /// Offer the cursor to every key.  Each key runs its own debounce, so
    /// overlapping keys may both fire.
    pub fn press(&mut self, cursor: Cursor, now: Duration) -> Vec<usize> {
        let delay = self.click_delay;
        self.keys
            .iter_mut()
            .enumerate()
            .filter_map(|(i, key)| {
                key.is_triggered(cursor.index_tip, cursor.middle_tip, now, delay)
                    .then_some(i)
            })
            .collect()
    }
}

pub fn map_frame(keyboard: &mut Keyboard, hands: &[Hand], policy: CursorPolicy, now: Duration) -> FrameEvents {
    let Some(cursor) = select_cursor(hands, policy) else {
        return FrameEvents::default();
    };
    let pressed = keyboard.press(cursor, now);
    for &i in &pressed {
        if let Some(k) = keyboard.key(i) {
            log::info!("key {:?} clicked", k.label());
        }
    }
    FrameEvents { cursor: Some(cursor), pressed }
}
