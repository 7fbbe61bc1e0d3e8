//! # air_keys
//!
//! The click-gesture interaction model behind an on-screen keyboard that is
//! typed on with two fingertips in front of a webcam.
//!
//! Each video frame yields zero or more detected hands.  The index fingertip
//! (landmark 8) and the middle fingertip (landmark 12) of one hand form the
//! **cursor**.  A key is *pressed* when both tips sit strictly inside its
//! rectangle and the key has not accepted a click within the last
//! `click_delay` (400 ms by default).  At 30+ fps a finger hovering over a
//! key would otherwise fire dozens of clicks per intended press.
//!
//! No I/O happens here.  Frames, detection and rendering belong to the
//! `air_keyboard` application crate.
//!
//! ## Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use air_keys::{build_keyboard, map_frame, apply_presses, CursorPolicy,
//!                Hand, KeyboardGeometry, TextBuffer, DEFAULT_ROWS};
//!
//! let mut kb  = build_keyboard(DEFAULT_ROWS, &KeyboardGeometry::default(),
//!                              Duration::from_millis(400));
//! let mut buf = TextBuffer::new();
//!
//! // Both fingertips inside "Q" (top-left key at 10,40 .. 85,115).
//! let hand = Hand::with_tips((40.0, 70.0), (50.0, 80.0));
//! let ev   = map_frame(&mut kb, &[hand], CursorPolicy::LastHand, Duration::ZERO);
//! apply_presses(&mut buf, &kb, &ev.pressed);
//! assert_eq!(buf.as_str(), "Q");
//! ```

pub mod geometry;
pub mod key;
pub mod layout;
pub mod hand;
pub mod gesture;
pub mod text;

pub use geometry::{Point, Rect, Size};
pub use key::{should_accept, Key, KeyAction, KeyVisual};
pub use layout::{build_keyboard, Keyboard, KeyboardGeometry, DEFAULT_ROWS};
pub use hand::{select_cursor, Cursor, CursorPolicy, Hand, Landmark};
pub use gesture::{map_frame, FrameEvents};
pub use text::{apply_presses, Applied, Outcome, TextBuffer};
