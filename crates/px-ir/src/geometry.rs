//! Integer pixel geometry.

use core::fmt;

/// A pixel coordinate. `(0, 0)` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A half-open rectangle: `min` is inside, `max` is one past the last
/// column and row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self {
            min: Point::ORIGIN,
            max: Point::new(width, height),
        }
    }

    pub const fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub const fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// Returns true if the rectangle contains no pixels.
    pub const fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Number of pixels covered.
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width() as u64 * self.height() as u64
        }
    }

    pub const fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// The bottom-right pixel, or `None` for an empty rectangle.
    pub fn last(&self) -> Option<Point> {
        if self.is_empty() {
            None
        } else {
            Some(Point::new(self.max.x - 1, self.max.y - 1))
        }
    }

    /// Nearest pixel inside the rectangle. An empty rectangle gives `min`.
    pub fn clamp(&self, p: Point) -> Point {
        if self.is_empty() {
            return self.min;
        }
        Point::new(
            p.x.clamp(self.min.x, self.max.x - 1),
            p.y.clamp(self.min.y, self.max.y - 1),
        )
    }

    /// Wrap a point into the rectangle on both axes.
    pub fn wrap(&self, p: Point) -> Point {
        if self.is_empty() {
            return self.min;
        }
        let x = (p.x - self.min.x).rem_euclid(self.width()) + self.min.x;
        let y = (p.y - self.min.y).rem_euclid(self.height()) + self.min.y;
        Point::new(x, y)
    }
}
