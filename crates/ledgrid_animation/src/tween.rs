//! Generic tween engine
//!
//! `Tween<K>` owns the timing state machine (window, curve, repeats,
//! auto-reverse, pause) and delegates the actual value mutation to a
//! `TweenKind`. Concrete kinds live in `values` and `palette`.
//!
//! ```text
//!           start()                t > end, auto-reverse
//!   Idle ───────────► Forward ───────────────────────────► Reverse
//!                      ▲  │ t > end, repeats left             │
//!                      └──┘◄──────────────────────────────────┘
//!                         │ t > end, no repeats left          │
//!                         ▼                                   ▼
//!                      Finished ◄─────────────────────────────┘
//! ```
//!
//! `stop()` / `resume()` pause any running state without losing its place.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::clock::{Timestamp, VirtualClock};
use crate::easing::Curve;
use crate::scheduler::AnimationController;
use crate::source::ValueSource;
use crate::task::{Animation, Task, TimingState};

/// Value mutation plugged into a `Tween`
pub trait TweenKind: Send + 'static {
    /// Called when the tween starts and again at every repeat
    fn init(&mut self) {}

    /// Apply curved progress `t` (normally in `[0, 1]`) to the target
    fn tick(&mut self, t: f64);
}

/// A kind with a single target value that can be resampled per cycle
pub trait TargetKind: TweenKind {
    type Value;

    /// Re-read the start value from the target cell at every (re)start
    fn set_continuation(&mut self, enabled: bool);

    fn set_target(&mut self, value: Self::Value);

    fn set_source(&mut self, source: Box<dyn ValueSource<Self::Value>>);
}

pub(crate) struct TweenState<K> {
    pub(crate) timing: TimingState,
    /// Window length in seconds
    total: f64,
    reverse: bool,
    auto_reverse: bool,
    curve: Curve,
    pub(crate) kind: K,
}

impl<K: TweenKind> TweenState<K> {
    fn open(&mut self, now: Timestamp) {
        self.timing.arm(now, self.timing.duration);
        self.total = self.timing.duration.as_secs_f64();
        self.reverse = false;
        self.kind.init();
    }

    fn rearm(&mut self) {
        self.timing.rearm(self.timing.duration);
        self.total = self.timing.duration.as_secs_f64();
    }

    fn step(&mut self, t: Timestamp) -> bool {
        if !self.timing.running {
            return false;
        }

        if t <= self.timing.end {
            let progress = if self.total > 0.0 {
                (t - self.timing.start).as_secs_f64() / self.total
            } else {
                1.0
            };
            let progress = if self.reverse {
                1.0 - progress
            } else {
                progress
            };
            self.kind.tick(self.curve.apply(progress));
            return true;
        }

        if self.reverse {
            self.kind.tick(self.curve.apply(0.0));
            if !self.timing.next_cycle() {
                return false;
            }
            self.reverse = false;
        } else {
            self.kind.tick(self.curve.apply(1.0));
            if self.auto_reverse {
                self.reverse = true;
                self.rearm();
                return true;
            }
            if !self.timing.next_cycle() {
                return false;
            }
        }

        self.rearm();
        self.kind.init();
        true
    }

    /// Saturates at `Duration::MAX` for huge repeat counts
    fn nominal_duration(&self) -> Duration {
        let mut factor = 1 + self.timing.repeat_count.max(0) as u64;
        if self.auto_reverse {
            factor *= 2;
        }
        u32::try_from(factor)
            .ok()
            .and_then(|factor| self.timing.duration.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

/// Time-driven animation of a single value
pub struct Tween<K: TweenKind> {
    clock: Arc<VirtualClock>,
    state: Mutex<TweenState<K>>,
}

impl<K: TweenKind> Tween<K> {
    /// Create a tween around `kind` and register it with the controller
    ///
    /// The tween is idle until `start()` is called.
    pub fn with_kind(ctrl: &AnimationController, kind: K, duration: Duration) -> Arc<Self> {
        let tween = Arc::new(Self::with_clock(Arc::clone(ctrl.clock()), kind, duration));
        ctrl.add(tween.clone());
        tween
    }

    pub(crate) fn with_clock(clock: Arc<VirtualClock>, kind: K, duration: Duration) -> Self {
        Self {
            clock,
            state: Mutex::new(TweenState {
                timing: TimingState::new(duration),
                total: duration.as_secs_f64(),
                reverse: false,
                auto_reverse: false,
                curve: Curve::default(),
                kind,
            }),
        }
    }

    /// Play every cycle forward and then backward
    pub fn set_auto_reverse(&self, enabled: bool) {
        self.state.lock().auto_reverse = enabled;
    }

    pub fn auto_reverse(&self) -> bool {
        self.state.lock().auto_reverse
    }

    pub fn set_curve(&self, curve: Curve) {
        self.state.lock().curve = curve;
    }

    /// Additional cycles after the first; negative repeats forever
    pub fn set_repeat_count(&self, count: i32) {
        self.state.lock().timing.repeat_count = count;
    }

    pub fn repeat_count(&self) -> i32 {
        self.state.lock().timing.repeat_count
    }

    /// True while playing the reverse half of a cycle
    pub fn is_reversed(&self) -> bool {
        self.state.lock().reverse
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, TweenState<K>> {
        self.state.lock()
    }
}

impl<K: TargetKind> Tween<K> {
    pub fn set_continuation(&self, enabled: bool) {
        self.state.lock().kind.set_continuation(enabled);
    }

    /// Change the end value; takes effect immediately
    pub fn set_target(&self, value: K::Value) {
        self.state.lock().kind.set_target(value);
    }

    /// Resolve the end value from `source` at every (re)start
    pub fn set_value_source(&self, source: impl ValueSource<K::Value> + 'static) {
        self.state.lock().kind.set_source(Box::new(source));
    }
}

impl<K: TweenKind> Task for Tween<K> {
    fn start(&self) {
        let mut state = self.state.lock();
        if state.timing.running {
            return;
        }
        state.open(self.clock.now());
    }

    fn is_stopped(&self) -> bool {
        !self.state.lock().timing.running
    }

    /// Full nominal run including repeats and reverse halves
    fn duration(&self) -> Duration {
        self.state.lock().nominal_duration()
    }
}

impl<K: TweenKind> Animation for Tween<K> {
    fn set_duration(&self, duration: Duration) {
        self.state.lock().timing.duration = duration;
    }

    fn stop(&self) {
        self.state.lock().timing.pause(self.clock.now());
    }

    fn resume(&self) {
        self.state.lock().timing.unpause(self.clock.now());
    }

    fn update(&self, t: Timestamp) -> bool {
        let active = self.state.lock().step(t);
        if !active {
            tracing::trace!(at = %t, "tween finished");
        }
        active
    }
}
