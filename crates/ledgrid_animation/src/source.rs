//! Dynamic tween targets
//!
//! A value source is asked for a fresh target every time a tween (re)starts
//! a cycle, never per frame. This is how "move to a random spot, then to
//! another one" is expressed with a single repeating tween.

use std::sync::Arc;

use ledgrid_core::{ColorSource, Point, Rect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{AnimationError, Result};

/// Generator of tween targets
pub trait ValueSource<T>: Send {
    fn next_value(&mut self) -> T;
}

impl<T, F> ValueSource<T> for F
where
    F: FnMut() -> T + Send,
{
    fn next_value(&mut self) -> T {
        self()
    }
}

/// Boxed value source as stored by tweens
pub type BoxedSource<T> = Box<dyn ValueSource<T>>;

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ============================================================================
// Random Sources
// ============================================================================

/// Random point inside a rectangle
pub struct RandPoint {
    rect: Rect,
    rng: StdRng,
}

impl RandPoint {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            rng: rng_from(None),
        }
    }

    pub fn seeded(rect: Rect, seed: u64) -> Self {
        Self {
            rect,
            rng: rng_from(Some(seed)),
        }
    }
}

impl ValueSource<Point> for RandPoint {
    fn next_value(&mut self) -> Point {
        let fx = self.rng.gen::<f64>();
        let fy = self.rng.gen::<f64>();
        self.rect.rel_pos(fx, fy)
    }
}

/// Random point inside a rectangle, snapped to multiples of `step`
pub struct RandPointTrunc {
    inner: RandPoint,
    step: f64,
}

impl RandPointTrunc {
    pub fn new(rect: Rect, step: f64) -> Self {
        Self {
            inner: RandPoint::new(rect),
            step,
        }
    }

    pub fn seeded(rect: Rect, step: f64, seed: u64) -> Self {
        Self {
            inner: RandPoint::seeded(rect, seed),
            step,
        }
    }
}

impl ValueSource<Point> for RandPointTrunc {
    fn next_value(&mut self) -> Point {
        let p = self.inner.next_value();
        Point::new(
            self.step * (p.x / self.step).round(),
            self.step * (p.y / self.step).round(),
        )
    }
}

/// Random size between two sizes (one random factor for both axes)
pub struct RandSize {
    from: Point,
    to: Point,
    rng: StdRng,
}

impl RandSize {
    pub fn new(from: Point, to: Point) -> Self {
        Self {
            from,
            to,
            rng: rng_from(None),
        }
    }

    pub fn seeded(from: Point, to: Point, seed: u64) -> Self {
        Self {
            from,
            to,
            rng: rng_from(Some(seed)),
        }
    }
}

impl ValueSource<Point> for RandSize {
    fn next_value(&mut self) -> Point {
        let t = self.rng.gen::<f64>();
        self.from.interpolate(self.to, t)
    }
}

/// Random float in `[a, b)`
pub struct RandFloat {
    a: f64,
    b: f64,
    rng: StdRng,
}

impl RandFloat {
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            a,
            b,
            rng: rng_from(None),
        }
    }

    pub fn seeded(a: f64, b: f64, seed: u64) -> Self {
        Self {
            a,
            b,
            rng: rng_from(Some(seed)),
        }
    }
}

impl ValueSource<f64> for RandFloat {
    fn next_value(&mut self) -> f64 {
        self.a + (self.b - self.a) * self.rng.gen::<f64>()
    }
}

/// Random alpha in `[a, b)`; yields `a` if the range is empty
pub struct RandAlpha {
    a: u8,
    b: u8,
    rng: StdRng,
}

impl RandAlpha {
    pub fn new(a: u8, b: u8) -> Self {
        Self {
            a,
            b,
            rng: rng_from(None),
        }
    }

    pub fn seeded(a: u8, b: u8, seed: u64) -> Self {
        Self {
            a,
            b,
            rng: rng_from(Some(seed)),
        }
    }
}

impl ValueSource<u8> for RandAlpha {
    fn next_value(&mut self) -> u8 {
        if self.b <= self.a {
            return self.a;
        }
        self.rng.gen_range(self.a..self.b)
    }
}

// ============================================================================
// Palette Sources
// ============================================================================

/// Shared palette handle
pub type PaletteRef = Arc<dyn ColorSource>;

/// Cycles through a fixed list of palettes
pub struct SeqPalette {
    palettes: Vec<PaletteRef>,
    next: usize,
}

impl SeqPalette {
    /// Fails with `EmptyPalette` for an empty list
    pub fn new(palettes: Vec<PaletteRef>) -> Result<Self> {
        if palettes.is_empty() {
            return Err(AnimationError::EmptyPalette);
        }
        Ok(Self { palettes, next: 0 })
    }
}

impl ValueSource<PaletteRef> for SeqPalette {
    fn next_value(&mut self) -> PaletteRef {
        let palette = Arc::clone(&self.palettes[self.next]);
        self.next = (self.next + 1) % self.palettes.len();
        palette
    }
}

/// Picks a random palette from a fixed list
pub struct RandPalette {
    palettes: Vec<PaletteRef>,
    rng: StdRng,
}

impl RandPalette {
    /// Fails with `EmptyPalette` for an empty list
    pub fn new(palettes: Vec<PaletteRef>) -> Result<Self> {
        if palettes.is_empty() {
            return Err(AnimationError::EmptyPalette);
        }
        Ok(Self {
            palettes,
            rng: rng_from(None),
        })
    }
}

impl ValueSource<PaletteRef> for RandPalette {
    fn next_value(&mut self) -> PaletteRef {
        let idx = self.rng.gen_range(0..self.palettes.len());
        Arc::clone(&self.palettes[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgrid_core::{Gradient, LedColor};

    #[test]
    fn test_rand_point_inside_rect() {
        let rect = Rect::new(Point::new(2.0, 3.0), Point::new(4.0, 8.0));
        let mut source = RandPoint::seeded(rect, 7);
        for _ in 0..100 {
            assert!(rect.contains(source.next_value()));
        }
    }

    #[test]
    fn test_rand_point_trunc_snaps() {
        let rect = Rect::new(Point::ZERO, Point::new(10.0, 10.0));
        let mut source = RandPointTrunc::seeded(rect, 0.5, 3);
        for _ in 0..100 {
            let p = source.next_value();
            assert_eq!((p.x * 2.0).fract(), 0.0);
            assert_eq!((p.y * 2.0).fract(), 0.0);
        }
    }

    #[test]
    fn test_rand_size_on_segment() {
        let mut source = RandSize::seeded(Point::new(1.0, 2.0), Point::new(3.0, 6.0), 11);
        for _ in 0..50 {
            let s = source.next_value();
            assert!((s.y - 2.0 * s.x).abs() < 1e-9);
            assert!((1.0..=3.0).contains(&s.x));
        }
    }

    #[test]
    fn test_rand_float_and_alpha_ranges() {
        let mut floats = RandFloat::seeded(-1.0, 1.0, 5);
        let mut alphas = RandAlpha::seeded(10, 20, 5);
        for _ in 0..100 {
            let f = floats.next_value();
            assert!((-1.0..1.0).contains(&f));
            let a = alphas.next_value();
            assert!((10..20).contains(&a));
        }
        assert_eq!(RandAlpha::seeded(9, 9, 1).next_value(), 9);
    }

    #[test]
    fn test_closure_source() {
        let mut n = 0.0;
        let mut source = move || {
            n += 1.0;
            n
        };
        assert_eq!(ValueSource::<f64>::next_value(&mut source), 1.0);
        assert_eq!(ValueSource::<f64>::next_value(&mut source), 2.0);
    }

    #[test]
    fn test_seq_palette_cycles() {
        let red: PaletteRef = Arc::new(Gradient::new(LedColor::RED, LedColor::RED));
        let blue: PaletteRef = Arc::new(Gradient::new(LedColor::BLUE, LedColor::BLUE));
        let mut source = SeqPalette::new(vec![red, blue]).unwrap();
        assert_eq!(source.next_value().color(0.5), LedColor::RED);
        assert_eq!(source.next_value().color(0.5), LedColor::BLUE);
        assert_eq!(source.next_value().color(0.5), LedColor::RED);

        assert!(matches!(
            SeqPalette::new(Vec::new()),
            Err(AnimationError::EmptyPalette)
        ));
        assert!(matches!(
            RandPalette::new(Vec::new()),
            Err(AnimationError::EmptyPalette)
        ));
    }
}
