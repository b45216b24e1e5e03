//! Plain value types for window geometry
//!
//! Coordinates are in physical pixels unless a caller says otherwise; DPI
//! scaling lives in `platform::win32::dpi`.

use serde::{Deserialize, Serialize};

/// A point in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A size in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Clamp both dimensions to at least one pixel
    ///
    /// The OS rejects or misrenders zero-area windows; every size that
    /// reaches a positioning call goes through this.
    pub fn clamped(self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
        }
    }
}

/// A rectangle as position plus size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Check if a point is inside this rectangle (exclusive bounds)
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_clamped() {
        assert_eq!(Size::new(0, 0).clamped(), Size::new(1, 1));
        assert_eq!(Size::new(-5, 10).clamped(), Size::new(1, 10));
        assert_eq!(Size::new(640, 480).clamped(), Size::new(640, 480));
    }

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(10, 20, 100, 50);
        assert_eq!(r.right(), 110);
        assert_eq!(r.bottom(), 70);
        assert_eq!(r.size(), Size::new(100, 50));
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(0, 0, 100, 100);
        assert!(r.contains(0, 0));
        assert!(r.contains(99, 99));
        assert!(!r.contains(100, 100));
        assert!(!r.contains(-1, 50));
    }

    #[test]
    fn test_rect_empty() {
        assert!(Rect::new(0, 0, 0, 10).is_empty());
        assert!(!Rect::new(0, 0, 1, 1).is_empty());
    }
}
