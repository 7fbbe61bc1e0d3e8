//! Detected hands and the two-fingertip cursor.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Hand landmark indices in the usual 21-point anatomical order.
#[allow(dead_code)]
pub mod landmarks {
    pub const WRIST:             usize = 0;
    pub const THUMB_CMC:         usize = 1;
    pub const THUMB_MCP:         usize = 2;
    pub const THUMB_IP:          usize = 3;
    pub const THUMB_TIP:         usize = 4;
    pub const INDEX_FINGER_MCP:  usize = 5;
    pub const INDEX_FINGER_PIP:  usize = 6;
    pub const INDEX_FINGER_DIP:  usize = 7;
    pub const INDEX_FINGER_TIP:  usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP:   usize = 13;
    pub const RING_FINGER_PIP:   usize = 14;
    pub const RING_FINGER_DIP:   usize = 15;
    pub const RING_FINGER_TIP:   usize = 16;
    pub const PINKY_MCP:         usize = 17;
    pub const PINKY_PIP:         usize = 18;
    pub const PINKY_DIP:         usize = 19;
    pub const PINKY_TIP:         usize = 20;

    pub const COUNT: usize = 21;
}

/// A landmark in pixel coordinates.  `z` is carried but never used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn to_point(self) -> Point {
        Point::new(self.x.round() as i32, self.y.round() as i32)
    }
}

/// One detected hand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hand {
    pub landmarks:  Vec<Landmark>,
    pub handedness: Option<String>,
    pub score:      f32,
}

/// The two fingertips that act as a pointer for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub index_tip:  Point,
    pub middle_tip: Point,
}

impl Hand {
    /// A full 21-landmark hand with every landmark at the wrist except the
    /// two cursor tips.  Used by simulators and tests.
    pub fn with_tips(index: (f32, f32), middle: (f32, f32)) -> Self {
        let mut lms = vec![Landmark::default(); landmarks::COUNT];
        lms[landmarks::INDEX_FINGER_TIP]  = Landmark { x: index.0,  y: index.1,  z: 0.0 };
        lms[landmarks::MIDDLE_FINGER_TIP] = Landmark { x: middle.0, y: middle.1, z: 0.0 };
        Hand { landmarks: lms, handedness: None, score: 1.0 }
    }

    /// `None` when the landmark list is too short to hold both tips.
    pub fn cursor(&self) -> Option<Cursor> {
        let index  = self.landmarks.get(landmarks::INDEX_FINGER_TIP)?;
        let middle = self.landmarks.get(landmarks::MIDDLE_FINGER_TIP)?;
        Some(Cursor { index_tip: index.to_point(), middle_tip: middle.to_point() })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Cursor selection
// ════════════════════════════════════════════════════════════════════════════

/// Which hand drives the keyboard when several are detected.
///
/// Only one cursor exists per frame.  `LastHand` matches the long-standing
/// behaviour where each hand in detection order overrides the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorPolicy {
    #[default]
    LastHand,
    FirstHand,
}

/// Pick this frame's cursor.  Hands with malformed landmark lists are
/// skipped rather than treated as errors.
pub fn select_cursor(hands: &[Hand], policy: CursorPolicy) -> Option<Cursor> {
    match policy {
        CursorPolicy::LastHand  => hands.iter().rev().find_map(Hand::cursor),
        CursorPolicy::FirstHand => hands.iter().find_map(Hand::cursor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reads_tips_and_rounds() {
        let h = Hand::with_tips((10.4, 20.6), (30.5, 40.0));
        let c = h.cursor().expect("full hand");
        assert_eq!(c.index_tip,  Point::new(10, 21));
        assert_eq!(c.middle_tip, Point::new(31, 40));
    }

    #[test]
    fn short_landmark_list_has_no_cursor() {
        let h = Hand { landmarks: vec![Landmark::default(); 12], ..Hand::default() };
        assert_eq!(h.cursor(), None);
    }

    #[test]
    fn thirteen_landmarks_are_enough() {
        let h = Hand { landmarks: vec![Landmark::default(); 13], ..Hand::default() };
        assert!(h.cursor().is_some());
    }

    #[test]
    fn no_hands_no_cursor() {
        assert_eq!(select_cursor(&[], CursorPolicy::LastHand), None);
    }

    #[test]
    fn last_hand_wins_by_default() {
        let first  = Hand::with_tips((1.0, 1.0), (2.0, 2.0));
        let second = Hand::with_tips((100.0, 100.0), (110.0, 110.0));
        let c = select_cursor(&[first, second], CursorPolicy::default()).expect("cursor");
        assert_eq!(c.index_tip, Point::new(100, 100));
    }

    #[test]
    fn first_hand_policy() {
        let first  = Hand::with_tips((1.0, 1.0), (2.0, 2.0));
        let second = Hand::with_tips((100.0, 100.0), (110.0, 110.0));
        let c = select_cursor(&[first, second], CursorPolicy::FirstHand).expect("cursor");
        assert_eq!(c.index_tip, Point::new(1, 1));
    }

    #[test]
    fn malformed_last_hand_falls_back_to_previous() {
        let good  = Hand::with_tips((5.0, 5.0), (6.0, 6.0));
        let short = Hand { landmarks: vec![Landmark::default(); 4], ..Hand::default() };
        let c = select_cursor(&[good, short], CursorPolicy::LastHand).expect("cursor");
        assert_eq!(c.index_tip, Point::new(5, 5));
    }
}
