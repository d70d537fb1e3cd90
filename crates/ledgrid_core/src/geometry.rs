//! Geometry types for animated objects
//!
//! Positions and sizes of grid objects share the same representation
//! (`Point`), so a size animation and a position animation are the same
//! thing. Integer and 26.6 fixed-point variants exist for objects placed on
//! the pixel grid and for glyph positioning.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

// ─────────────────────────────────────────────────────────────────────────────
// Floating Point Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point (also used for sizes and offsets)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };
    pub const ONE: Point = Point { x: 1.0, y: 1.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation: `t = 0` yields `self`, `t = 1` yields `other`
    pub fn interpolate(&self, other: Point, t: f64) -> Point {
        Point::new(
            (1.0 - t) * self.x + t * other.x,
            (1.0 - t) * self.y + t * other.y,
        )
    }

    /// Component-wise multiplication
    pub fn scale(&self, factor: Point) -> Point {
        Point::new(self.x * factor.x, self.y * factor.y)
    }

    /// Component-wise minimum
    pub fn min(&self, other: Point) -> Point {
        Point::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum
    pub fn max(&self, other: Point) -> Point {
        Point::new(self.x.max(other.x), self.y.max(other.y))
    }

    pub fn add_xy(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn sub_xy(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x - dx, self.y - dy)
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Round to the nearest integer point
    pub fn round(&self) -> IntPoint {
        IntPoint::new(self.x.round() as i32, self.y.round() as i32)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Axis-aligned rectangle given by its minimum and maximum corner
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        min: Point::ZERO,
        max: Point::ZERO,
    };

    pub const fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Create a rect from two arbitrary corner points
    pub fn from_points(p1: Point, p2: Point) -> Self {
        Rect {
            min: p1.min(p2),
            max: p1.max(p2),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Point {
        self.max - self.min
    }

    /// Point at the relative position (`fx`, `fy`) inside the rect
    ///
    /// `(0, 0)` is the minimum corner, `(1, 1)` the maximum corner.
    pub fn rel_pos(&self, fx: f64, fy: f64) -> Point {
        Point::new(
            self.min.x + fx * self.width(),
            self.min.y + fy * self.height(),
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Expand rect to include a point
    pub fn expand_to_include(&self, point: Point) -> Self {
        Rect {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Integer Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// 2D point on the pixel grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

impl IntPoint {
    pub const ZERO: IntPoint = IntPoint { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point {
        Point::new(f64::from(self.x), f64::from(self.y))
    }
}

impl From<IntPoint> for Point {
    fn from(p: IntPoint) -> Self {
        p.to_point()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixed Point Geometry (26.6)
// ─────────────────────────────────────────────────────────────────────────────

/// Signed 26.6 fixed-point number (6 fractional bits)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(64);

    /// Nearest fixed-point value to `x`
    pub fn from_f64(x: f64) -> Self {
        Fixed((x * 64.0).round() as i32)
    }

    pub fn from_int(i: i32) -> Self {
        Fixed(i << 6)
    }

    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / 64.0
    }

    /// Fixed-point multiplication, rounded to nearest
    pub fn mul(self, rhs: Fixed) -> Fixed {
        let prod = i64::from(self.0) * i64::from(rhs.0);
        Fixed(((prod + (1 << 5)) >> 6) as i32)
    }
}

impl Add for Fixed {
    type Output = Fixed;

    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

/// 2D point in 26.6 fixed-point coordinates (glyph positioning)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FixedPoint {
    pub x: Fixed,
    pub y: Fixed,
}

impl FixedPoint {
    pub const ZERO: FixedPoint = FixedPoint {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    pub fn from_point(p: Point) -> Self {
        Self::new(Fixed::from_f64(p.x), Fixed::from_f64(p.y))
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x.to_f64(), self.y.to_f64())
    }

    /// Multiply both coordinates by a fixed-point factor
    pub fn mul(self, k: Fixed) -> FixedPoint {
        FixedPoint::new(self.x.mul(k), self.y.mul(k))
    }
}

impl Add for FixedPoint {
    type Output = FixedPoint;

    fn add(self, rhs: FixedPoint) -> FixedPoint {
        FixedPoint::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for FixedPoint {
    type Output = FixedPoint;

    fn sub(self, rhs: FixedPoint) -> FixedPoint {
        FixedPoint::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance_and_interpolate() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);

        let mid = a.interpolate(b, 0.5);
        assert_eq!(mid, Point::new(1.5, 2.0));
        assert_eq!(a.interpolate(b, 0.0), a);
        assert_eq!(a.interpolate(b, 1.0), b);
    }

    #[test]
    fn test_point_scale_is_component_wise() {
        let p = Point::new(2.0, -3.0).scale(Point::new(0.5, 2.0));
        assert_eq!(p, Point::new(1.0, -6.0));
    }

    #[test]
    fn test_rect_rel_pos() {
        let r = Rect::from_points(Point::new(10.0, 4.0), Point::new(0.0, 0.0));
        assert_eq!(r.min, Point::new(0.0, 0.0));
        assert_eq!(r.rel_pos(0.5, 0.25), Point::new(5.0, 1.0));
        assert!(r.contains(Point::new(10.0, 4.0)));
        assert!(!r.contains(Point::new(10.5, 4.0)));
    }

    #[test]
    fn test_fixed_arithmetic() {
        assert_eq!(Fixed::from_f64(1.5), Fixed(96));
        assert_eq!(Fixed::from_int(2).mul(Fixed::from_f64(0.25)), Fixed(32));
        assert_eq!(Fixed(96).to_f64(), 1.5);

        let p = FixedPoint::from_point(Point::new(2.0, 4.0));
        assert_eq!(p.mul(Fixed::from_f64(0.5)).to_point(), Point::new(1.0, 2.0));
    }
}
