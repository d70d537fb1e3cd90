//! LedGrid Core
//!
//! Value types shared between the animation engine and whatever draws the
//! LED panel:
//!
//! - **Geometry**: `Point` (positions and sizes), `Rect`, `IntPoint`,
//!   `FixedPoint` (26.6 fixed point)
//! - **Colors**: `LedColor` and the `ColorSource` palette capability
//! - **Shared cells**: `SharedValue<T>`, the storage animations write into
//!
//! # Example
//!
//! ```rust
//! use ledgrid_core::{LedColor, Point, SharedValue};
//!
//! let pos = SharedValue::new(Point::new(1.0, 2.0));
//! let handle = pos.clone();
//! handle.set(Point::new(3.0, 4.0));
//! assert_eq!(pos.get(), Point::new(3.0, 4.0));
//!
//! let mid = LedColor::BLACK.interpolate(LedColor::WHITE, 0.5);
//! assert_eq!(mid.r, 127);
//! ```

pub mod color;
pub mod geometry;
pub mod value;

pub use color::{ColorSource, Gradient, LedColor};
pub use geometry::{Fixed, FixedPoint, IntPoint, Point, Rect};
pub use value::SharedValue;
