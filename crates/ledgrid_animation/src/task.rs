//! Task and animation contracts
//!
//! A `Task` is anything a composite can launch: it can be started, reports
//! whether it is stopped, and knows its nominal duration. An `Animation` is
//! a task the controller drives every tick.
//!
//! Both traits take `&self`; every implementation guards its own state with
//! its own lock so the same handle can sit in the controller registry and in
//! any number of composites.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Timestamp;

/// Something that can be launched by a composite
pub trait Task: Send + Sync {
    /// Start the task; a no-op if it is already running
    fn start(&self);

    /// True if the task is paused, finished or was never started
    fn is_stopped(&self) -> bool;

    /// Nominal run time
    fn duration(&self) -> Duration;
}

/// A task driven by the controller tick
pub trait Animation: Task {
    fn set_duration(&self, duration: Duration);

    /// Pause; a no-op if not running
    fn stop(&self);

    /// Continue after `stop` without a visible jump; a no-op if not paused
    fn resume(&self);

    /// Advance to virtual time `t`. Returns false once the animation is done.
    fn update(&self, t: Timestamp) -> bool;
}

/// Shared handle to a task
pub type TaskRef = Arc<dyn Task>;

/// Shared handle to an animation
pub type AnimationRef = Arc<dyn Animation>;

/// Build a `Vec<TaskRef>` from animation handles of mixed concrete types
///
/// ```ignore
/// let seq = Sequence::new(&ctrl, tasks![fade_in, move_right, fade_out])?;
/// ```
#[macro_export]
macro_rules! tasks {
    ($($task:expr),* $(,)?) => {
        vec![$(::std::sync::Arc::clone(&$task) as $crate::task::TaskRef),*]
    };
}

/// Stable identity of a shared handle, independent of its trait object type
pub(crate) fn identity<T: ?Sized>(handle: &Arc<T>) -> usize {
    Arc::as_ptr(handle) as *const () as usize
}

// ============================================================================
// Timing State
// ============================================================================

/// Window, repeat and pause bookkeeping shared by tweens and composites
#[derive(Clone, Debug, Default)]
pub(crate) struct TimingState {
    /// Configured duration of one cycle
    pub duration: Duration,
    /// 0 runs once, negative repeats forever
    pub repeat_count: i32,
    pub start: Timestamp,
    pub end: Timestamp,
    stopped_at: Timestamp,
    pub repeats_left: i32,
    pub running: bool,
    paused: bool,
}

impl TimingState {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    /// Open the first window `[now, now + window]`
    pub fn arm(&mut self, now: Timestamp, window: Duration) {
        self.start = now;
        self.end = now + window;
        self.repeats_left = self.repeat_count;
        self.running = true;
        self.paused = false;
    }

    /// Returns false if the state was not running
    pub fn pause(&mut self, now: Timestamp) -> bool {
        if !self.running {
            return false;
        }
        self.stopped_at = now;
        self.running = false;
        self.paused = true;
        true
    }

    /// Shift the window by the paused interval. Returns false if not paused.
    pub fn unpause(&mut self, now: Timestamp) -> bool {
        if self.running || !self.paused {
            return false;
        }
        let dt = now - self.stopped_at;
        self.start += dt;
        self.end += dt;
        self.running = true;
        self.paused = false;
        true
    }

    /// Consume one repeat. Returns false (and stops) when none are left.
    pub fn next_cycle(&mut self) -> bool {
        if self.repeats_left == 0 {
            self.running = false;
            return false;
        }
        if self.repeats_left > 0 {
            self.repeats_left -= 1;
        }
        true
    }

    /// Open the window following the current one
    pub fn rearm(&mut self, window: Duration) {
        self.start = self.end;
        self.end = self.start + window;
    }
}
