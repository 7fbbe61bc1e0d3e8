//! A single on-screen key and its click debounce.
//!
//! The debounce is split in two: [`should_accept`] is a pure predicate over
//! timestamps, and [`Key::is_triggered`] combines it with the hit-test and
//! records the accepted click.  Keeping the predicate pure lets the timing
//! rules be tested without any geometry.

use std::time::Duration;

use crate::geometry::{Point, Rect};

// ════════════════════════════════════════════════════════════════════════════
// Debounce predicate
// ════════════════════════════════════════════════════════════════════════════

/// Accept a click at `now` if the key was never clicked, or if at least
/// `delay` has elapsed since `last_click`.
///
/// A clock that appears to run backwards (`now < last_click`) never accepts.
pub fn should_accept(now: Duration, last_click: Option<Duration>, delay: Duration) -> bool {
    match last_click {
        None       => true,
        Some(last) => now.checked_sub(last).is_some_and(|dt| dt >= delay),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// KeyAction
// ════════════════════════════════════════════════════════════════════════════

pub const DELETE_LABEL: &str = "DEL";
pub const CLEAR_LABEL:  &str = "CLEAR";
pub const EXIT_LABEL:   &str = "EXIT";

/// What pressing a key does to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Append the text to the buffer.
    Char(String),
    /// Remove the last character.
    Delete,
    /// Empty the buffer.
    Clear,
    /// End the session.
    Exit,
}

impl KeyAction {
    pub fn from_label(label: &str) -> Self {
        match label {
            DELETE_LABEL => KeyAction::Delete,
            CLEAR_LABEL  => KeyAction::Clear,
            EXIT_LABEL   => KeyAction::Exit,
            other        => KeyAction::Char(other.to_string()),
        }
    }
}

/// The two visual states a renderer must distinguish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyVisual {
    Idle,
    Pressed,
}

// ════════════════════════════════════════════════════════════════════════════
// Key
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Key {
    label:      String,
    action:     KeyAction,
    bounds:     Rect,
    /// Session time of the last accepted click; `None` until the first one.
    last_click: Option<Duration>,
}

impl Key {
    pub fn new(label: impl Into<String>, bounds: Rect) -> Self {
        let label = label.into();
        Key {
            action: KeyAction::from_label(&label),
            label,
            bounds,
            last_click: None,
        }
    }

    pub fn label(&self)      -> &str              { &self.label }
    pub fn action(&self)     -> &KeyAction        { &self.action }
    pub fn bounds(&self)     -> Rect              { self.bounds }
    pub fn last_click(&self) -> Option<Duration>  { self.last_click }

    /// Pure hit-test: both points strictly inside the key.
    pub fn hit(&self, a: Point, b: Point) -> bool {
        self.bounds.contains_strict(a) && self.bounds.contains_strict(b)
    }

    /// Hit-test plus debounce.  On acceptance `last_click` moves to `now`.
    ///
    /// A hover that is rejected by the debounce does not extend the window:
    /// the next click is measured from the last *accepted* one.
    pub fn is_triggered(&mut self, a: Point, b: Point, now: Duration, delay: Duration) -> bool {
        if !self.hit(a, b) || !should_accept(now, self.last_click, delay) {
            return false;
        }
        self.last_click = Some(now);
        true
    }

    pub fn visual_state(triggered: bool) -> KeyVisual {
        if triggered { KeyVisual::Pressed } else { KeyVisual::Idle }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    const DELAY: Duration = Duration::from_millis(400);

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    fn key_h() -> Key {
        Key::new("H", Rect::new(Point::new(410, 120), Size::new(75, 75)))
    }

    fn inside() -> (Point, Point) { (Point::new(440, 150), Point::new(450, 160)) }

    #[test]
    fn never_clicked_always_accepts() {
        assert!(should_accept(Duration::ZERO, None, DELAY));
    }

    #[test]
    fn accepts_exactly_at_delay() {
        assert!(should_accept(ms(900), Some(ms(500)), DELAY));
        assert!(!should_accept(ms(899), Some(ms(500)), DELAY));
    }

    #[test]
    fn backwards_clock_rejects() {
        assert!(!should_accept(ms(100), Some(ms(500)), DELAY));
    }

    #[test]
    fn two_attempts_inside_window_yield_one_click() {
        let mut k = key_h();
        let (a, b) = inside();
        assert!(k.is_triggered(a, b, ms(0), DELAY));
        assert!(!k.is_triggered(a, b, ms(399), DELAY));
        assert_eq!(k.last_click(), Some(ms(0)));
    }

    #[test]
    fn two_attempts_a_window_apart_yield_two_clicks() {
        let mut k = key_h();
        let (a, b) = inside();
        assert!(k.is_triggered(a, b, ms(0), DELAY));
        assert!(k.is_triggered(a, b, ms(400), DELAY));
        assert_eq!(k.last_click(), Some(ms(400)));
    }

    #[test]
    fn one_point_outside_does_not_trigger() {
        let mut k = key_h();
        let (a, _) = inside();
        assert!(!k.is_triggered(a, Point::new(600, 150), ms(0), DELAY));
        assert_eq!(k.last_click(), None);
    }

    #[test]
    fn point_on_boundary_does_not_trigger() {
        let mut k = key_h();
        let (a, _) = inside();
        assert!(!k.is_triggered(a, Point::new(410, 150), ms(0), DELAY));
        assert!(!k.is_triggered(a, Point::new(485, 150), ms(0), DELAY));
        assert!(!k.is_triggered(a, Point::new(440, 195), ms(0), DELAY));
    }

    #[test]
    fn missed_hit_leaves_timestamp_untouched() {
        let mut k = key_h();
        let (a, b) = inside();
        assert!(k.is_triggered(a, b, ms(0), DELAY));
        assert!(!k.is_triggered(Point::new(0, 0), b, ms(1000), DELAY));
        assert_eq!(k.last_click(), Some(ms(0)));
    }

    #[test]
    fn labels_map_to_actions() {
        assert_eq!(KeyAction::from_label("DEL"),   KeyAction::Delete);
        assert_eq!(KeyAction::from_label("CLEAR"), KeyAction::Clear);
        assert_eq!(KeyAction::from_label("EXIT"),  KeyAction::Exit);
        assert_eq!(KeyAction::from_label(";"),     KeyAction::Char(";".into()));
    }

    #[test]
    fn visual_state_follows_trigger() {
        assert_eq!(Key::visual_state(true),  KeyVisual::Pressed);
        assert_eq!(Key::visual_state(false), KeyVisual::Idle);
    }
}
