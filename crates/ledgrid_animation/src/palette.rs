//! Palette driven tweens
//!
//! Palettes themselves belong to the color system; these tweens only see
//! them through `ColorSource`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ledgrid_core::{ColorSource, LedColor, SharedValue};
use parking_lot::Mutex;

use crate::easing::Curve;
use crate::scheduler::AnimationController;
use crate::source::{BoxedSource, PaletteRef, ValueSource};
use crate::tween::{Tween, TweenKind};

// ============================================================================
// Palette Sweep
// ============================================================================

/// Writes `palette.color(t)` into a color cell
pub struct PaletteKind {
    cell: SharedValue<LedColor>,
    palette: PaletteRef,
}

impl TweenKind for PaletteKind {
    fn tick(&mut self, t: f64) {
        self.cell.set(self.palette.color(t));
    }
}

pub type PaletteTween = Tween<PaletteKind>;

impl Tween<PaletteKind> {
    /// Sweep `cell` through all colors of `palette` (linear curve)
    pub fn new(
        ctrl: &AnimationController,
        cell: &SharedValue<LedColor>,
        palette: PaletteRef,
        duration: Duration,
    ) -> Arc<Self> {
        let kind = PaletteKind {
            cell: cell.clone(),
            palette,
        };
        let tween = Tween::with_kind(ctrl, kind, duration);
        tween.set_curve(Curve::Linear);
        tween
    }
}

// ============================================================================
// Palette Fader
// ============================================================================

struct FaderState {
    current: PaletteRef,
    next: PaletteRef,
    /// Blend position towards `next`, 0 = only `current`
    pos: f64,
}

/// Color source blending smoothly from one palette to the next
///
/// Objects colored from a fader can switch palettes without a hard cut; a
/// `PaletteFadeTween` drives the blend.
pub struct PaletteFader {
    state: Mutex<FaderState>,
}

impl PaletteFader {
    pub fn new(palette: PaletteRef) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FaderState {
                current: Arc::clone(&palette),
                next: palette,
                pos: 0.0,
            }),
        })
    }

    /// Palette currently shown (ignoring a fade in progress)
    pub fn current(&self) -> PaletteRef {
        Arc::clone(&self.state.lock().current)
    }

    pub fn fade_pos(&self) -> f64 {
        self.state.lock().pos
    }

    fn prepare(&self, next: PaletteRef) {
        let mut state = self.state.lock();
        state.next = next;
        state.pos = 0.0;
    }

    fn set_pos(&self, t: f64) {
        let mut state = self.state.lock();
        if t >= 1.0 {
            state.current = Arc::clone(&state.next);
            state.pos = 0.0;
        } else {
            state.pos = t;
        }
    }
}

impl ColorSource for PaletteFader {
    fn color(&self, t: f64) -> LedColor {
        let state = self.state.lock();
        let c1 = state.current.color(t);
        if state.pos > 0.0 {
            c1.interpolate(state.next.color(t), state.pos)
        } else {
            c1
        }
    }
}

impl fmt::Debug for PaletteFader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaletteFader")
            .field("pos", &self.fade_pos())
            .finish_non_exhaustive()
    }
}

/// Fades a `PaletteFader` over to a target palette
pub struct PaletteFadeKind {
    fader: Arc<PaletteFader>,
    target: PaletteRef,
    source: Option<BoxedSource<PaletteRef>>,
}

impl TweenKind for PaletteFadeKind {
    fn init(&mut self) {
        if let Some(source) = self.source.as_mut() {
            self.target = source.next_value();
        }
        self.fader.prepare(Arc::clone(&self.target));
    }

    fn tick(&mut self, t: f64) {
        self.fader.set_pos(t);
    }
}

pub type PaletteFadeTween = Tween<PaletteFadeKind>;

impl Tween<PaletteFadeKind> {
    pub fn new(
        ctrl: &AnimationController,
        fader: &Arc<PaletteFader>,
        target: PaletteRef,
        duration: Duration,
    ) -> Arc<Self> {
        let kind = PaletteFadeKind {
            fader: Arc::clone(fader),
            target,
            source: None,
        };
        Tween::with_kind(ctrl, kind, duration)
    }

    /// Pick the target palette from `source` at every (re)start
    pub fn set_palette_source(&self, source: impl ValueSource<PaletteRef> + 'static) {
        self.lock().kind.source = Some(Box::new(source));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualTime, Timestamp};
    use crate::config::ControllerConfig;
    use crate::source::SeqPalette;
    use crate::task::{Animation, Task};
    use ledgrid_core::Gradient;

    fn controller() -> AnimationController {
        let config = ControllerConfig::default().with_workers(1);
        AnimationController::with_time_source(config, Arc::new(ManualTime::new())).unwrap()
    }

    fn solid(color: LedColor) -> PaletteRef {
        Arc::new(Gradient::new(color, color))
    }

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    #[test]
    fn test_palette_sweep() {
        let ctrl = controller();
        let cell = SharedValue::new(LedColor::RED);
        let palette: PaletteRef = Arc::new(Gradient::new(LedColor::BLACK, LedColor::WHITE));
        let tween = PaletteTween::new(&ctrl, &cell, palette, Duration::from_secs(2));
        tween.start();
        tween.update(at(1.0));
        assert_eq!(cell.get(), LedColor::rgb(127, 127, 127));
        tween.update(at(2.0));
        assert_eq!(cell.get(), LedColor::WHITE);
    }

    #[test]
    fn test_fader_blends_and_swaps() {
        let ctrl = controller();
        let fader = PaletteFader::new(solid(LedColor::BLACK));
        let tween =
            PaletteFadeTween::new(&ctrl, &fader, solid(LedColor::WHITE), Duration::from_secs(1));
        tween.set_curve(Curve::Linear);

        tween.start();
        tween.update(at(0.5));
        assert!((fader.fade_pos() - 0.5).abs() < 1e-9);
        assert_eq!(fader.color(0.3), LedColor::rgb(127, 127, 127));

        assert!(!tween.update(at(1.5)));
        assert_eq!(fader.fade_pos(), 0.0);
        assert_eq!(fader.color(0.3), LedColor::WHITE);
        assert_eq!(fader.current().color(0.0), LedColor::WHITE);
    }

    #[test]
    fn test_fader_palette_source() {
        let ctrl = controller();
        let fader = PaletteFader::new(solid(LedColor::BLACK));
        let tween =
            PaletteFadeTween::new(&ctrl, &fader, solid(LedColor::WHITE), Duration::from_secs(1));
        let source = SeqPalette::new(vec![solid(LedColor::RED), solid(LedColor::BLUE)]).unwrap();
        tween.set_palette_source(source);
        tween.set_repeat_count(1);

        tween.start();
        tween.update(at(1.5));
        assert_eq!(fader.current().color(0.0), LedColor::RED);
        assert!(!tween.update(at(2.5)));
        assert_eq!(fader.current().color(0.0), LedColor::BLUE);
        assert_eq!(tween.duration(), Duration::from_secs(2));
    }
}
