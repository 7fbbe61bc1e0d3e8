//! Software rendering of the keyboard overlay onto a [`Frame`].
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                                                     [EXIT]   │
//! │ [Q][W][E][R][T][Y][U][I][O][P]                               │
//! │ [A][S][D][F][G][H][J][K][L][;]       (camera picture)        │
//! │ [Z][X][C][V][B][N][M][,][.][/]                               │
//! │ [DEL][CLEAR]                                                 │
//! │                                                              │
//! │   ┌──────────────────── typed text ───────────────────────┐  │
//! │   └───────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Colours come from an immutable [`Theme`] passed in by the caller.

use serde::{Deserialize, Serialize};

use air_keys::{Cursor, Key, KeyVisual, Keyboard, Point, Rect, Size};

use crate::camera::Frame;

// ════════════════════════════════════════════════════════════════════════════
// Theme
// ════════════════════════════════════════════════════════════════════════════

/// Colours as `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Idle keys fade from `key_top` to `key_bottom`.
    pub key_top:       u32,
    pub key_bottom:    u32,
    pub key_pressed:   u32,
    pub key_label:     u32,
    pub text_box:      u32,
    pub text:          u32,
    pub cursor:        u32,
    pub cursor_radius: i32,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            key_top:       0x1F77B4,
            key_bottom:    0x008000,
            key_pressed:   0xFF0000,
            key_label:     0xFFFFFF,
            text_box:      0xC8C8C8,
            text:          0xFFFFFF,
            cursor:        0x0000FF,
            cursor_radius: 15,
        }
    }
}

const LABEL_PAD:      i32 = 10;
const MAX_KEY_SCALE:  i32 = 6;
const TEXT_SCALE:     i32 = 5;
const TEXT_BOX_H:     i32 = 50;
const TEXT_BOX_INSET: i32 = 50;
/// Distance of the text box's top edge from the bottom of the frame.
const TEXT_BOX_RISE:  i32 = 70;

/// Where the typed text is shown for a frame of the given size.
pub fn text_box_rect(width: usize, height: usize) -> Rect {
    Rect::new(
        Point::new(TEXT_BOX_INSET, height as i32 - TEXT_BOX_RISE),
        Size::new(width as i32 - 2 * TEXT_BOX_INSET, TEXT_BOX_H),
    )
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas — clipped pixel primitives
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas<'a> {
    frame: &'a mut Frame,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut Frame) -> Self { Canvas { frame } }

    fn clip(&self, r: Rect) -> Option<(usize, usize, usize, usize)> {
        let x0 = r.origin.x.max(0);
        let y0 = r.origin.y.max(0);
        let x1 = r.right().min(self.frame.width as i32);
        let y1 = r.bottom().min(self.frame.height as i32);
        (x0 < x1 && y0 < y1).then(|| (x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    pub fn fill_rect(&mut self, r: Rect, color: u32) {
        let Some((x0, y0, x1, y1)) = self.clip(r) else { return };
        let w = self.frame.width;
        for row in y0..y1 {
            self.frame.pixels[row * w + x0..row * w + x1].fill(color);
        }
    }

    /// Each row is a blend of `top` and `bottom` by its height fraction.
    pub fn fill_gradient(&mut self, r: Rect, top: u32, bottom: u32) {
        let h = r.size.height.max(1);
        for i in 0..r.size.height {
            let row = Rect::new(Point::new(r.origin.x, r.origin.y + i), Size::new(r.size.width, 1));
            self.fill_rect(row, blend(top, bottom, i as f32 / h as f32));
        }
    }

    pub fn draw_border(&mut self, r: Rect, color: u32) {
        let (x, y, w, h) = (r.origin.x, r.origin.y, r.size.width, r.size.height);
        self.fill_rect(Rect::new(Point::new(x, y),         Size::new(w, 1)), color);
        self.fill_rect(Rect::new(Point::new(x, y + h - 1), Size::new(w, 1)), color);
        self.fill_rect(Rect::new(Point::new(x, y),         Size::new(1, h)), color);
        self.fill_rect(Rect::new(Point::new(x + w - 1, y), Size::new(1, h)), color);
    }

    /// Only the part of the disc inside the frame is visited, so centres far
    /// off-canvas cost nothing and cannot overflow.
    pub fn fill_disc(&mut self, c: Point, r: i32, color: u32) {
        let (cx, cy, r) = (c.x as i64, c.y as i64, r.max(0) as i64);
        let (w, h) = (self.frame.width as i64, self.frame.height as i64);
        let (x0, x1) = ((cx - r).max(0), (cx + r).min(w - 1));
        let (y0, y1) = ((cy - r).max(0), (cy + r).min(h - 1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    self.frame.pixels[(y * w + x) as usize] = color;
                }
            }
        }
    }

    /// Bitmap text, each 3×5 glyph cell magnified `scale` times.
    pub fn draw_text(&mut self, text: &str, at: Point, scale: i32, color: u32) {
        let scale = scale.max(1);
        let mut cx = at.x;
        for ch in text.chars() {
            for (row, &bits) in char_glyph(ch).iter().enumerate() {
                for col in 0..3 {
                    if bits & (1 << (2 - col)) != 0 {
                        let cell = Rect::new(
                            Point::new(cx + col * scale, at.y + row as i32 * scale),
                            Size::new(scale, scale),
                        );
                        self.fill_rect(cell, color);
                    }
                }
            }
            cx += GLYPH_ADVANCE * scale;
            if cx >= self.frame.width as i32 { break; }
        }
    }
}

/// Width in pixels of `text` at `scale`, without trailing spacing.
pub fn text_width(text: &str, scale: i32) -> i32 {
    let n = text.chars().count() as i32;
    if n == 0 { 0 } else { (n * GLYPH_ADVANCE - 1) * scale }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay
// ════════════════════════════════════════════════════════════════════════════

/// Draw one key in its idle or pressed state.
pub fn draw_key(canvas: &mut Canvas<'_>, key: &Key, visual: KeyVisual, theme: &Theme) {
    let b = key.bounds();
    match visual {
        KeyVisual::Pressed => canvas.fill_rect(b, theme.key_pressed),
        KeyVisual::Idle    => canvas.fill_gradient(b, theme.key_top, theme.key_bottom),
    }

    // biggest scale that fits the label inside the padding
    let room  = b.size.width - 2 * LABEL_PAD;
    let scale = (1..=MAX_KEY_SCALE)
        .rev()
        .find(|&s| text_width(key.label(), s) <= room)
        .unwrap_or(1);
    let y = b.origin.y + (b.size.height - GLYPH_ROWS * scale) / 2;
    canvas.draw_text(key.label(), Point::new(b.origin.x + LABEL_PAD, y), scale, theme.key_label);
}

pub fn draw_keyboard(canvas: &mut Canvas<'_>, keyboard: &Keyboard, pressed: &[usize], theme: &Theme) {
    for (i, key) in keyboard.keys().iter().enumerate() {
        draw_key(canvas, key, Key::visual_state(pressed.contains(&i)), theme);
    }
}

pub fn draw_cursor(canvas: &mut Canvas<'_>, cursor: &Cursor, theme: &Theme) {
    canvas.fill_disc(cursor.index_tip,  theme.cursor_radius, theme.cursor);
    canvas.fill_disc(cursor.middle_tip, theme.cursor_radius, theme.cursor);
}

pub fn draw_text_box(canvas: &mut Canvas<'_>, area: Rect, text: &str, theme: &Theme) {
    canvas.fill_rect(area, theme.text_box);
    let y = area.origin.y + (area.size.height - GLYPH_ROWS * TEXT_SCALE) / 2;
    canvas.draw_text(text, Point::new(area.origin.x + 5, y), TEXT_SCALE, theme.text);
}

/// Everything drawn on top of the camera picture for one frame.
pub fn render_overlay(
    frame:    &mut Frame,
    keyboard: &Keyboard,
    pressed:  &[usize],
    cursor:   Option<&Cursor>,
    text:     &str,
    theme:    &Theme,
) {
    let area = text_box_rect(frame.width, frame.height);
    let mut canvas = Canvas::new(frame);
    draw_keyboard(&mut canvas, keyboard, pressed, theme);
    if let Some(c) = cursor {
        draw_cursor(&mut canvas, c, theme);
    }
    draw_text_box(&mut canvas, area, text, theme);
}

/// Linear blend of two `0xRRGGBB` colours. `t` = 0.0 → all `a`, 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |shift: u32| {
        let (ca, cb) = ((a >> shift) & 0xFF, (b >> shift) & 0xFF);
        ((ca as f32 * (1.0 - t) + cb as f32 * t).round() as u32) << shift
    };
    lerp(16) | lerp(8) | lerp(0)
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

const GLYPH_ROWS:    i32 = 5;
const GLYPH_ADVANCE: i32 = 4;

fn char_glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        ';' => [0b000, 0b010, 0b000, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}
