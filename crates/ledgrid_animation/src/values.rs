//! Interpolated value tweens
//!
//! Provides the `Interpolate` trait for everything a tween can move between
//! two endpoints, and the tween kinds that write into `SharedValue` cells:
//! floats, alpha values, colors, positions and sizes (including path
//! motion), fixed-point and integer positions, and image frame indices.

use std::sync::Arc;
use std::time::Duration;

use ledgrid_core::{Fixed, FixedPoint, IntPoint, LedColor, Point, SharedValue};

use crate::easing::Curve;
use crate::path::{PathFn, PolygonPath};
use crate::scheduler::AnimationController;
use crate::source::{BoxedSource, ValueSource};
use crate::task::Animation;
use crate::tween::{TargetKind, Tween, TweenKind};

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone + Send + 'static {
    /// Interpolate between self (`t = 0`) and other (`t = 1`)
    fn lerp(&self, other: &Self, t: f64) -> Self;

    /// Check if two values are approximately equal
    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool;
}

// ============================================================================
// Interpolate Implementations
// ============================================================================

impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        (1.0 - t) * self + t * other
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self - other).abs() < epsilon
    }
}

/// Alpha values are truncated, not rounded
impl Interpolate for u8 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        ((1.0 - t) * f64::from(*self) + t * f64::from(*other)) as u8
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (f64::from(*self) - f64::from(*other)).abs() < epsilon
    }
}

impl Interpolate for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self.interpolate(*other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.distance(*other) < epsilon
    }
}

/// Interpolated in floating point, then rounded to the grid
impl Interpolate for IntPoint {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self.to_point().interpolate(other.to_point(), t).round()
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.to_point().distance(other.to_point()) < epsilon
    }
}

/// Interpolated in 26.6 fixed point
impl Interpolate for FixedPoint {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self.mul(Fixed::from_f64(1.0 - t)) + other.mul(Fixed::from_f64(t))
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.to_point().distance(other.to_point()) < epsilon
    }
}

impl Interpolate for LedColor {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self.interpolate(*other, t)
    }

    fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        [
            (self.r, other.r),
            (self.g, other.g),
            (self.b, other.b),
            (self.a, other.a),
        ]
        .iter()
        .all(|(a, b)| (f64::from(*a) - f64::from(*b)).abs() < epsilon)
    }
}

// ============================================================================
// Plain Value Tweens
// ============================================================================

/// Tween kind moving a cell linearly from `from` to `to`
pub struct ValueKind<T: Interpolate> {
    cell: SharedValue<T>,
    from: T,
    to: T,
    continuation: bool,
    source: Option<BoxedSource<T>>,
}

impl<T: Interpolate> ValueKind<T> {
    pub fn new(cell: &SharedValue<T>, to: T) -> Self {
        Self {
            cell: cell.clone(),
            from: cell.get(),
            to,
            continuation: false,
            source: None,
        }
    }
}

impl<T: Interpolate> TweenKind for ValueKind<T> {
    fn init(&mut self) {
        if self.continuation {
            self.from = self.cell.get();
        }
        if let Some(source) = self.source.as_mut() {
            self.to = source.next_value();
        }
    }

    fn tick(&mut self, t: f64) {
        self.cell.set(self.from.lerp(&self.to, t));
    }
}

impl<T: Interpolate> TargetKind for ValueKind<T> {
    type Value = T;

    fn set_continuation(&mut self, enabled: bool) {
        self.continuation = enabled;
    }

    fn set_target(&mut self, value: T) {
        self.to = value;
    }

    fn set_source(&mut self, source: Box<dyn ValueSource<T>>) {
        self.source = Some(source);
    }
}

/// Angles, border widths and other scalar properties
pub type FloatTween = Tween<ValueKind<f64>>;

/// 8-bit alpha values
pub type AlphaTween = Tween<ValueKind<u8>>;

/// Positions on the pixel grid
pub type IntPosTween = Tween<ValueKind<IntPoint>>;

/// 26.6 fixed-point positions (text placement)
pub type FixedPosTween = Tween<ValueKind<FixedPoint>>;

impl<T: Interpolate> Tween<ValueKind<T>> {
    /// Tween `cell` from its current value to `to`
    pub fn new(
        ctrl: &AnimationController,
        cell: &SharedValue<T>,
        to: T,
        duration: Duration,
    ) -> Arc<Self> {
        Tween::with_kind(ctrl, ValueKind::new(cell, to), duration)
    }
}

// ============================================================================
// Color Tween
// ============================================================================

/// Like `ValueKind<LedColor>`, but keeps the alpha currently in the cell
pub struct ColorKind {
    inner: ValueKind<LedColor>,
}

impl TweenKind for ColorKind {
    fn init(&mut self) {
        self.inner.init();
    }

    fn tick(&mut self, t: f64) {
        let color = self.inner.from.lerp(&self.inner.to, t);
        self.inner.cell.update(|c| *c = color.with_alpha(c.a));
    }
}

impl TargetKind for ColorKind {
    type Value = LedColor;

    fn set_continuation(&mut self, enabled: bool) {
        self.inner.set_continuation(enabled);
    }

    fn set_target(&mut self, value: LedColor) {
        self.inner.set_target(value);
    }

    fn set_source(&mut self, source: Box<dyn ValueSource<LedColor>>) {
        self.inner.set_source(source);
    }
}

pub type ColorTween = Tween<ColorKind>;

impl Tween<ColorKind> {
    pub fn new(
        ctrl: &AnimationController,
        cell: &SharedValue<LedColor>,
        to: LedColor,
        duration: Duration,
    ) -> Arc<Self> {
        let kind = ColorKind {
            inner: ValueKind::new(cell, to),
        };
        Tween::with_kind(ctrl, kind, duration)
    }
}

// ============================================================================
// Position, Size and Path Tweens
// ============================================================================

/// Moves a point along a path
///
/// The path offset is scaled component-wise by `size`; with a zero size the
/// scale is `to - from`, which turns the linear path into a plain
/// position tween.
pub struct PathKind {
    cell: SharedValue<Point>,
    from: Point,
    to: Point,
    size: Point,
    path: PathFn,
    continuation: bool,
    source: Option<BoxedSource<Point>>,
}

impl PathKind {
    fn new(cell: &SharedValue<Point>, to: Point, size: Point, path: PathFn) -> Self {
        Self {
            cell: cell.clone(),
            from: cell.get(),
            to,
            size,
            path,
            continuation: false,
            source: None,
        }
    }
}

impl TweenKind for PathKind {
    fn init(&mut self) {
        if self.continuation {
            self.from = self.cell.get();
        }
        if let Some(source) = self.source.as_mut() {
            // sized paths resample their extent, unsized ones their target
            if self.size.is_zero() {
                self.to = source.next_value();
            } else {
                self.size = source.next_value();
            }
        }
    }

    fn tick(&mut self, t: f64) {
        let scale = if self.size.is_zero() {
            self.to - self.from
        } else {
            self.size
        };
        self.cell.set(self.from + self.path.point(t).scale(scale));
    }
}

impl TargetKind for PathKind {
    type Value = Point;

    fn set_continuation(&mut self, enabled: bool) {
        self.continuation = enabled;
    }

    fn set_target(&mut self, value: Point) {
        self.to = value;
    }

    fn set_source(&mut self, source: Box<dyn ValueSource<Point>>) {
        self.source = Some(source);
    }
}

pub type PathTween = Tween<PathKind>;

impl Tween<PathKind> {
    /// Straight move from the current position to `to`
    pub fn position(
        ctrl: &AnimationController,
        cell: &SharedValue<Point>,
        to: Point,
        duration: Duration,
    ) -> Arc<Self> {
        Tween::with_kind(
            ctrl,
            PathKind::new(cell, to, Point::ZERO, PathFn::Linear),
            duration,
        )
    }

    /// Sizes are points too; identical to `position`
    pub fn size(
        ctrl: &AnimationController,
        cell: &SharedValue<Point>,
        to: Point,
        duration: Duration,
    ) -> Arc<Self> {
        Self::position(ctrl, cell, to, duration)
    }

    /// Move along `path`, scaled by `size`
    pub fn path(
        ctrl: &AnimationController,
        cell: &SharedValue<Point>,
        path: PathFn,
        size: Point,
        duration: Duration,
    ) -> Arc<Self> {
        let kind = PathKind::new(cell, cell.get(), size, path);
        Tween::with_kind(ctrl, kind, duration)
    }

    /// Move along a polygon given in absolute units
    pub fn polygon(
        ctrl: &AnimationController,
        cell: &SharedValue<Point>,
        polygon: Arc<PolygonPath>,
        duration: Duration,
    ) -> Arc<Self> {
        Self::path(ctrl, cell, PathFn::Polygon(polygon), Point::ONE, duration)
    }
}

// ============================================================================
// Image Tween
// ============================================================================

/// Steps a frame index through a list of frame durations
pub struct ImageKind {
    cell: SharedValue<usize>,
    /// Cumulative end time of every frame
    stamps: Vec<Duration>,
}

impl ImageKind {
    fn total(&self) -> Duration {
        self.stamps.last().copied().unwrap_or_default()
    }
}

impl TweenKind for ImageKind {
    fn init(&mut self) {
        self.cell.set(0);
    }

    fn tick(&mut self, t: f64) {
        if self.stamps.is_empty() {
            return;
        }
        let ts = t * self.total().as_secs_f64();
        let idx = self
            .stamps
            .iter()
            .position(|stamp| stamp.as_secs_f64() >= ts)
            .unwrap_or(self.stamps.len() - 1);
        self.cell.set(idx);
    }
}

pub type ImageTween = Tween<ImageKind>;

impl Tween<ImageKind> {
    /// Empty frame list; add frames with `add_frame`
    pub fn new(ctrl: &AnimationController, cell: &SharedValue<usize>) -> Arc<Self> {
        let kind = ImageKind {
            cell: cell.clone(),
            stamps: Vec::new(),
        };
        let tween = Tween::with_kind(ctrl, kind, Duration::ZERO);
        tween.set_curve(Curve::Linear);
        tween
    }

    /// Append a frame shown for `duration`; extends the tween accordingly
    pub fn add_frame(&self, duration: Duration) {
        let total = {
            let mut state = self.lock();
            let total = state.kind.total() + duration;
            state.kind.stamps.push(total);
            total
        };
        self.set_duration(total);
    }

    pub fn frame_count(&self) -> usize {
        self.lock().kind.stamps.len()
    }
}
