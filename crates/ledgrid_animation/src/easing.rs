//! Animation curves
//!
//! A curve maps the linear progress `t` of a tween window onto the value
//! progress actually applied. Every curve maps `0 -> 0` and `1 -> 1`; what
//! happens in between is up to the curve and may overshoot.

use std::fmt;
use std::sync::Arc;

/// Progress curve applied by tweens
#[derive(Clone, Default)]
pub enum Curve {
    /// Constant speed
    Linear,
    /// Slow start (`t²`)
    EaseIn,
    /// Slow end (`t(2 - t)`)
    EaseOut,
    /// Slow start and end, piecewise quadratic
    #[default]
    EaseInOut,
    /// Slow start and end, cubic smoothstep (`3t² - 2t³`)
    SmoothStep,
    /// Caller supplied curve
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl Curve {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Curve::Custom(Arc::new(f))
    }

    /// Apply the curve to progress `t`
    pub fn apply(&self, t: f64) -> f64 {
        match self {
            Curve::Linear => t,
            Curve::EaseIn => t * t,
            Curve::EaseOut => t * (2.0 - t),
            Curve::EaseInOut => {
                if t <= 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Curve::SmoothStep => (3.0 - 2.0 * t) * t * t,
            Curve::Custom(f) => f(t),
        }
    }
}

impl fmt::Debug for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::Linear => write!(f, "Linear"),
            Curve::EaseIn => write!(f, "EaseIn"),
            Curve::EaseOut => write!(f, "EaseOut"),
            Curve::EaseInOut => write!(f, "EaseInOut"),
            Curve::SmoothStep => write!(f, "SmoothStep"),
            Curve::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
