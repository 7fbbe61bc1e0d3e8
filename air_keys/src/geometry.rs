//! Integer pixel-space geometry.

use serde::{Deserialize, Serialize};

/// A point in pixel space; `y` grows downward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self { Point { x, y } }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self { Point { x, y } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width:  i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self { Size { width, height } }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    pub origin: Point,
    pub size:   Size,
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self { Rect { origin, size } }

    pub fn right(&self)  -> i32 { self.origin.x + self.size.width  }
    pub fn bottom(&self) -> i32 { self.origin.y + self.size.height }

    /// True iff `p` lies strictly inside; points on an edge are outside.
    pub fn contains_strict(&self, p: Point) -> bool {
        self.origin.x < p.x && p.x < self.right()
            && self.origin.y < p.y && p.y < self.bottom()
    }
}
