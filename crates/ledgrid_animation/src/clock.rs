//! Virtual, pausable time
//!
//! All animations read time from one `VirtualClock` owned by the controller.
//! Virtual time follows the wall clock minus the total time the controller
//! spent stopped, so pausing and resuming never makes an animation jump.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

// ============================================================================
// Timestamp
// ============================================================================

/// A point in virtual time, measured from the clock origin
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub const fn from_duration(d: Duration) -> Self {
        Self(d)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self(Duration::from_secs_f64(secs))
    }

    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Time elapsed since `earlier`, zero if `earlier` is later
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

/// Saturates; an endless window ends at the largest representable time
impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl AddAssign<Duration> for Timestamp {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs);
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        self.saturating_since(rhs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0.as_secs_f64())
    }
}

// ============================================================================
// Time Sources
// ============================================================================

/// Source of wall time for a `VirtualClock`
pub trait TimeSource: Send + Sync {
    /// Wall time elapsed since the source was created
    fn elapsed(&self) -> Duration;
}

/// Monotonic system time
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually stepped time, for deterministic stepping and tests
#[derive(Default)]
pub struct ManualTime {
    now: Mutex<Duration>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, d: Duration) {
        *self.now.lock() += d;
    }

    /// Jump to an absolute time; moving backwards is ignored
    pub fn set(&self, t: Duration) {
        let mut now = self.now.lock();
        if t > *now {
            *now = t;
        }
    }
}

impl TimeSource for ManualTime {
    fn elapsed(&self) -> Duration {
        *self.now.lock()
    }
}

// ============================================================================
// Virtual Clock
// ============================================================================

#[derive(Default)]
struct ClockState {
    /// Accumulated time spent stopped
    delay: Duration,
    /// Wall time at which the clock was stopped
    stopped_at: Option<Duration>,
}

/// Pausable clock shared by the controller and every animation
pub struct VirtualClock {
    source: Arc<dyn TimeSource>,
    state: Mutex<ClockState>,
}

impl VirtualClock {
    pub fn new(source: Arc<dyn TimeSource>) -> Self {
        Self {
            source,
            state: Mutex::new(ClockState::default()),
        }
    }

    /// Clock driven by monotonic system time
    pub fn monotonic() -> Self {
        Self::new(Arc::new(MonotonicTime::new()))
    }

    /// Current virtual time; frozen while the clock is stopped
    pub fn now(&self) -> Timestamp {
        let state = self.state.lock();
        let wall = match state.stopped_at {
            Some(stopped_at) => stopped_at,
            None => self.source.elapsed(),
        };
        Timestamp(wall.saturating_sub(state.delay))
    }

    /// Freeze virtual time. Returns false if already stopped.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        if state.stopped_at.is_some() {
            return false;
        }
        state.stopped_at = Some(self.source.elapsed());
        true
    }

    /// Unfreeze virtual time. Returns false if not stopped.
    pub fn resume(&self) -> bool {
        let mut state = self.state.lock();
        match state.stopped_at.take() {
            Some(stopped_at) => {
                let paused = self.source.elapsed().saturating_sub(stopped_at);
                state.delay += paused;
                true
            }
            None => false,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().stopped_at.is_some()
    }

    /// Total wall time the clock has spent stopped (completed pauses only)
    pub fn paused_total(&self) -> Duration {
        self.state.lock().delay
    }
}

impl fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualClock")
            .field("now", &self.now())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
