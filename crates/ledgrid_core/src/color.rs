//! LED colors and the palette capability
//!
//! `LedColor` is the 8-bit RGBA value that ends up on the panel. Gamma
//! correction happens on the receiving side, so nothing here is linearized.

use std::fmt;

/// RGBA color with 8 bits per channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl LedColor {
    pub const BLACK: LedColor = LedColor::rgb(0x00, 0x00, 0x00);
    pub const WHITE: LedColor = LedColor::rgb(0xff, 0xff, 0xff);
    pub const RED: LedColor = LedColor::rgb(0xff, 0x00, 0x00);
    pub const GREEN: LedColor = LedColor::rgb(0x00, 0xff, 0x00);
    pub const BLUE: LedColor = LedColor::rgb(0x00, 0x00, 0xff);
    pub const TRANSPARENT: LedColor = LedColor::rgba(0x00, 0x00, 0x00, 0x00);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from `0xRRGGBB`
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb(
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
        )
    }

    /// Color from `0xRRGGBBAA`
    pub const fn from_hex_rgba(hex: u32) -> Self {
        Self::rgba(
            ((hex >> 24) & 0xff) as u8,
            ((hex >> 16) & 0xff) as u8,
            ((hex >> 8) & 0xff) as u8,
            (hex & 0xff) as u8,
        )
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.a = alpha;
        self
    }

    /// Color between `self` (`t = 0`) and `other` (`t = 1`)
    ///
    /// `t` is clamped to `[0, 1]`. Intermediate channels are truncated, not
    /// rounded, which is what the panel firmware expects.
    pub fn interpolate(&self, other: LedColor, t: f64) -> LedColor {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 {
            return *self;
        }
        if t == 1.0 {
            return other;
        }
        let mix = |a: u8, b: u8| ((1.0 - t) * f64::from(a) + t * f64::from(b)) as u8;
        LedColor::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Blend towards white
    pub fn bright(&self, t: f64) -> LedColor {
        self.interpolate(LedColor::WHITE, t)
    }

    /// Blend towards black
    pub fn dark(&self, t: f64) -> LedColor {
        self.interpolate(LedColor::BLACK, t)
    }
}

impl Default for LedColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for LedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{0x{:02X}, 0x{:02X}, 0x{:02X}, 0x{:02X}}}",
            self.r, self.g, self.b, self.a
        )
    }
}

/// Anything that maps a position `t` in `[0, 1]` to a color
///
/// Palettes implement this; palette sweeps and shaders only ever see this
/// trait.
pub trait ColorSource: Send + Sync {
    fn color(&self, t: f64) -> LedColor;
}

impl<F> ColorSource for F
where
    F: Fn(f64) -> LedColor + Send + Sync,
{
    fn color(&self, t: f64) -> LedColor {
        self(t)
    }
}

/// Two-color gradient, the simplest palette
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gradient {
    pub from: LedColor,
    pub to: LedColor,
}

impl Gradient {
    pub const fn new(from: LedColor, to: LedColor) -> Self {
        Self { from, to }
    }
}

impl ColorSource for Gradient {
    fn color(&self, t: f64) -> LedColor {
        self.from.interpolate(self.to, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_constructors() {
        assert_eq!(LedColor::from_hex(0x102030), LedColor::rgb(0x10, 0x20, 0x30));
        assert_eq!(
            LedColor::from_hex_rgba(0x10203040),
            LedColor::rgba(0x10, 0x20, 0x30, 0x40)
        );
    }

    #[test]
    fn test_interpolate_endpoints_and_clamp() {
        let a = LedColor::rgba(0, 0, 0, 0);
        let b = LedColor::rgba(255, 100, 10, 255);
        assert_eq!(a.interpolate(b, 0.0), a);
        assert_eq!(a.interpolate(b, 1.0), b);
        assert_eq!(a.interpolate(b, -3.0), a);
        assert_eq!(a.interpolate(b, 7.0), b);
    }

    #[test]
    fn test_interpolate_truncates() {
        let a = LedColor::rgb(0, 0, 0);
        let b = LedColor::rgb(255, 3, 1);
        let mid = a.interpolate(b, 0.5);
        assert_eq!(mid.r, 127);
        assert_eq!(mid.g, 1);
        assert_eq!(mid.b, 0);
        assert_eq!(mid.a, 255);
    }

    #[test]
    fn test_gradient_and_closure_sources() {
        let g = Gradient::new(LedColor::BLACK, LedColor::WHITE);
        assert_eq!(g.color(1.0), LedColor::WHITE);

        let constant = |_t: f64| LedColor::RED;
        assert_eq!(constant.color(0.3), LedColor::RED);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LedColor::rgba(1, 2, 0xab, 0xff).to_string(),
            "{0x01, 0x02, 0xAB, 0xFF}"
        );
    }
}
