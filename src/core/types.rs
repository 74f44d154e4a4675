use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

/// 2D point with integer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// 2D size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn area(&self) -> i32 {
        self.width * self.height
    }
}

/// Rectangle defined by top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[must_use]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn area(&self) -> i32 {
        self.width * self.height
    }

    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Scalar value (up to 4 channels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar {
    pub val: [f64; 4],
}

impl Scalar {
    #[must_use]
    pub fn new(v0: f64, v1: f64, v2: f64, v3: f64) -> Self {
        Self { val: [v0, v1, v2, v3] }
    }

    #[must_use]
    pub fn all(v: f64) -> Self {
        Self { val: [v, v, v, v] }
    }
}

/// Color conversion codes. Only the grayscale reductions the detector's
/// "ensure grayscale" preprocessing step needs are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorConversionCode {
    BgrToGray,
    RgbToGray,
    BgraToGray,
    RgbaToGray,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_operations() {
        let p1 = Point::new(10, 20);
        let p2 = Point::new(5, 3);
        let sum = p1 + p2;
        assert_eq!(sum, Point::new(15, 23));
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10, 10, 100, 100);
        assert!(rect.contains(Point::new(50, 50)));
        assert!(!rect.contains(Point::new(5, 5)));
    }

    #[test]
    fn test_scalar_all() {
        let s = Scalar::all(10.0);
        assert_eq!(s.val, [10.0, 10.0, 10.0, 10.0]);
    }
}
