//! Motion paths
//!
//! A path maps progress `t ∈ [0, 1]` to an offset relative to the starting
//! point of the motion. Every path starts at `(0, 0)`. Path tweens scale the
//! offset component-wise by a size, so the unit circle paths below can
//! describe ellipses of any extent.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use ledgrid_core::{Point, Rect};

use crate::error::{AnimationError, Result};

/// Offset generator for path tweens
#[derive(Clone)]
pub enum PathFn {
    /// Straight line from `(0, 0)` to `(1, 1)`
    Linear,
    /// Full circle, first moving right (`x` leads)
    FullCircleA,
    /// Full circle, first moving down (`y` leads)
    FullCircleB,
    /// Half circle ending at `(1, 0)`
    HalfCircleA,
    /// Half circle ending at `(0, 1)`
    HalfCircleB,
    /// Quarter circle ending at `(1, 1)`, leaving horizontally
    QuarterCircleA,
    /// Quarter circle ending at `(1, 1)`, leaving vertically
    QuarterCircleB,
    /// Arc-length parameterized polygon
    Polygon(Arc<PolygonPath>),
    /// Caller supplied path
    Custom(Arc<dyn Fn(f64) -> Point + Send + Sync>),
}

impl PathFn {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> Point + Send + Sync + 'static,
    {
        PathFn::Custom(Arc::new(f))
    }

    /// Offset at progress `t`
    pub fn point(&self, t: f64) -> Point {
        match self {
            PathFn::Linear => Point::new(t, t),
            PathFn::FullCircleA => {
                let phi = 2.0 * PI * t;
                Point::new(0.5 * phi.sin(), 0.5 * (1.0 - phi.cos()))
            }
            PathFn::FullCircleB => {
                let phi = 2.0 * PI * t;
                Point::new(0.5 * (1.0 - phi.cos()), 0.5 * phi.sin())
            }
            PathFn::HalfCircleA => {
                let phi = PI * t;
                Point::new(0.5 * (1.0 - phi.cos()), 0.5 * phi.sin())
            }
            PathFn::HalfCircleB => {
                let phi = PI * t;
                Point::new(0.5 * phi.sin(), 0.5 * (1.0 - phi.cos()))
            }
            PathFn::QuarterCircleA => {
                let phi = 0.5 * PI * t;
                Point::new(phi.sin(), 1.0 - phi.cos())
            }
            PathFn::QuarterCircleB => {
                let phi = 0.5 * PI * t;
                Point::new(1.0 - phi.cos(), phi.sin())
            }
            PathFn::Polygon(path) => path.rel_point(t),
            PathFn::Custom(f) => f(t),
        }
    }
}

impl fmt::Debug for PathFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathFn::Linear => write!(f, "Linear"),
            PathFn::FullCircleA => write!(f, "FullCircleA"),
            PathFn::FullCircleB => write!(f, "FullCircleB"),
            PathFn::HalfCircleA => write!(f, "HalfCircleA"),
            PathFn::HalfCircleB => write!(f, "HalfCircleB"),
            PathFn::QuarterCircleA => write!(f, "QuarterCircleA"),
            PathFn::QuarterCircleB => write!(f, "QuarterCircleB"),
            PathFn::Polygon(path) => f.debug_tuple("Polygon").field(path).finish(),
            PathFn::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

// ============================================================================
// Polygon Path
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
struct Stop {
    /// Arc length from the first point
    len: f64,
    /// Offset from the first point
    pos: Point,
}

/// Open polygon traversed at constant speed
///
/// Built once from its corner points, then queried by any number of tweens
/// concurrently.
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonPath {
    stops: Vec<Stop>,
    bounds: Rect,
}

impl PolygonPath {
    pub fn new(points: impl IntoIterator<Item = Point>) -> Result<Self> {
        let mut points = points.into_iter();
        let origin = points.next().ok_or(AnimationError::EmptyPath)?;

        let mut stops = vec![Stop {
            len: 0.0,
            pos: Point::ZERO,
        }];
        let mut bounds = Rect::ZERO;
        for point in points {
            let pos = point - origin;
            let last = stops[stops.len() - 1];
            stops.push(Stop {
                len: last.len + last.pos.distance(pos),
                pos,
            });
            bounds = bounds.expand_to_include(pos);
        }

        Ok(Self { stops, bounds })
    }

    /// Total arc length
    pub fn length(&self) -> f64 {
        self.stops.last().map_or(0.0, |stop| stop.len)
    }

    /// Bounding box of all offsets (contains the origin)
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Offset at the point `t · length` along the polygon
    pub fn rel_point(&self, t: f64) -> Point {
        let target = t * self.length();
        for pair in self.stops.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if target < b.len {
                let segment = b.len - a.len;
                let f = if segment > 0.0 {
                    (target - a.len) / segment
                } else {
                    0.0
                };
                return a.pos.interpolate(b.pos, f);
            }
        }
        self.stops.last().map_or(Point::ZERO, |stop| stop.pos)
    }
}
