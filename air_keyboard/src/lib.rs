//! # air_keyboard
//!
//! An on-screen keyboard typed on with hand gestures in front of a webcam.
//! Point the index and middle fingertips together at a key to press it.
//!
//! Each frame runs one pass of
//! capture → detect → map → apply → render → present → poll quit,
//! all on the calling thread.
//!
//! ## Keys
//!
//! | Key | Action |
//! |---|---|
//! | letters, `;` `,` `.` `/` | append to the text box |
//! | `DEL` | remove the last character |
//! | `CLEAR` | empty the text box |
//! | `EXIT` (top right) | end the session |
//!
//! ## Sources
//!
//! * (default) **Simulation**: a synthetic backdrop plus a mouse-driven
//!   hand.  Hold the left button to pinch the fingertips together.
//! * `camera.source = "ffmpeg"`: a real webcam read through `ffmpeg`.
//! * `detector.kind = "pipe"`: landmarks from an external model process
//!   (see [`detector::LandmarkPipe`] for the protocol).
//!
//! The host quit key (`q` by default) or closing the window also ends the
//! session.

pub mod error;
pub mod config;
pub mod camera;
pub mod detector;
pub mod render;
pub mod visualizer;
pub mod app;
