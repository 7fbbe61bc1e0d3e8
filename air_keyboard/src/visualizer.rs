//! On-screen presentation using `minifb`.

use std::sync::mpsc::Sender;
use std::time::Duration;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::camera::Frame;
use crate::detector::PointerInput;
use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// Display trait
// ════════════════════════════════════════════════════════════════════════════

pub trait Display {
    /// Show `frame`.  Returns false once the display can no longer show
    /// anything (e.g. the user closed the window).
    fn present(&mut self, frame: &Frame) -> bool;

    /// Short, non-blocking check for the host quit keystroke.
    fn quit_requested(&mut self) -> bool;

    /// Tear the display down.  Calling it more than once is harmless.
    fn close(&mut self);
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn present(&mut self, frame: &Frame) -> bool { (**self).present(frame) }
    fn quit_requested(&mut self) -> bool         { (**self).quit_requested() }
    fn close(&mut self)                          { (**self).close() }
}

/// The `minifb` key for a configured quit character, if it has one.
pub fn key_for_char(c: char) -> Option<Key> {
    let key = match c.to_ascii_lowercase() {
        'a' => Key::A, 'b' => Key::B, 'c' => Key::C, 'd' => Key::D, 'e' => Key::E,
        'f' => Key::F, 'g' => Key::G, 'h' => Key::H, 'i' => Key::I, 'j' => Key::J,
        'k' => Key::K, 'l' => Key::L, 'm' => Key::M, 'n' => Key::N, 'o' => Key::O,
        'p' => Key::P, 'q' => Key::Q, 'r' => Key::R, 's' => Key::S, 't' => Key::T,
        'u' => Key::U, 'v' => Key::V, 'w' => Key::W, 'x' => Key::X, 'y' => Key::Y,
        'z' => Key::Z,
        '0' => Key::Key0, '1' => Key::Key1, '2' => Key::Key2, '3' => Key::Key3,
        '4' => Key::Key4, '5' => Key::Key5, '6' => Key::Key6, '7' => Key::Key7,
        '8' => Key::Key8, '9' => Key::Key9,
        ' ' => Key::Space,
        '\u{1b}' => Key::Escape,
        _ => return None,
    };
    Some(key)
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:   Option<Window>,
    quit_key: Key,
    /// Set in pointer-simulation mode: mouse state goes to the detector.
    pointer:  Option<Sender<PointerInput>>,
}

impl Visualizer {
    pub fn new(
        title:    &str,
        width:    usize,
        height:   usize,
        quit_key: char,
        pointer:  Option<Sender<PointerInput>>,
    ) -> Result<Self, AppError> {
        let quit_key = key_for_char(quit_key).unwrap_or_else(|| {
            log::warn!("quit key {:?} has no window binding, using 'q'", quit_key);
            Key::Q
        });

        let mut window = Window::new(
            title,
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer { window: Some(window), quit_key, pointer })
    }

    fn send_pointer(&self, window: &Window) {
        let Some(tx) = &self.pointer else { return };
        let input = PointerInput {
            pos:     window.get_mouse_pos(MouseMode::Discard),
            pinched: window.get_mouse_down(MouseButton::Left),
        };
        let _ = tx.send(input);
    }
}

impl Display for Visualizer {
    fn present(&mut self, frame: &Frame) -> bool {
        let Some(window) = self.window.as_mut() else { return false };
        if !window.is_open() {
            return false;
        }
        if let Err(e) = window.update_with_buffer(&frame.pixels, frame.width, frame.height) {
            log::warn!("window update failed: {}", e);
            return false;
        }
        if let Some(window) = self.window.as_ref() {
            self.send_pointer(window);
        }
        true
    }

    fn quit_requested(&mut self) -> bool {
        self.window
            .as_ref()
            .map_or(true, |w| w.is_key_pressed(self.quit_key, KeyRepeat::No))
    }

    fn close(&mut self) {
        if self.window.take().is_some() {
            log::info!("window closed");
        }
    }
}

impl Drop for Visualizer {
    fn drop(&mut self) { self.close(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_chars_map_to_keys() {
        assert_eq!(key_for_char('q'), Some(Key::Q));
        assert_eq!(key_for_char('Q'), Some(Key::Q));
        assert_eq!(key_for_char('\u{1b}'), Some(Key::Escape));
        assert_eq!(key_for_char('€'), None);
    }
}
