//! Zero-duration tasks
//!
//! These do their work inside `start()` and are stopped immediately after.
//! They are meant to be placed in groups, sequences and timelines and are
//! not registered with the controller.
//!
//! A closure run by one of these tasks executes inside an update pass. It
//! must not add or remove animations on the controller, since the pass holds
//! the registry lock.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ledgrid_core::SharedValue;

use crate::task::{Animation, AnimationRef, Task};

/// Runs a closure when started
pub struct BackgroundTask {
    f: Box<dyn Fn() + Send + Sync>,
}

impl BackgroundTask {
    pub fn new<F>(f: F) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::new(Self { f: Box::new(f) })
    }
}

impl Task for BackgroundTask {
    fn start(&self) {
        (self.f)();
    }

    fn is_stopped(&self) -> bool {
        true
    }

    fn duration(&self) -> Duration {
        Duration::ZERO
    }
}

impl fmt::Debug for BackgroundTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundTask").finish_non_exhaustive()
    }
}

/// Flips a `hidden` flag when started
#[derive(Debug)]
pub struct VisibilityToggle {
    hidden: SharedValue<bool>,
}

impl VisibilityToggle {
    pub fn new(hidden: &SharedValue<bool>) -> Arc<Self> {
        Arc::new(Self {
            hidden: hidden.clone(),
        })
    }
}

impl Task for VisibilityToggle {
    fn start(&self) {
        self.hidden.update(|hidden| *hidden = !*hidden);
    }

    fn is_stopped(&self) -> bool {
        true
    }

    fn duration(&self) -> Duration {
        Duration::ZERO
    }
}

/// Pauses a running animation or resumes a paused one when started
///
/// The target must not be a composite that (transitively) contains this
/// toggle.
pub struct PauseToggle {
    target: AnimationRef,
}

impl PauseToggle {
    pub fn new(target: AnimationRef) -> Arc<Self> {
        Arc::new(Self { target })
    }
}

impl Task for PauseToggle {
    fn start(&self) {
        if self.target.is_stopped() {
            self.target.resume();
        } else {
            self.target.stop();
        }
    }

    fn is_stopped(&self) -> bool {
        true
    }

    fn duration(&self) -> Duration {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualTime, VirtualClock};
    use crate::tween::{Tween, TweenKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Nop;

    impl TweenKind for Nop {
        fn tick(&mut self, _t: f64) {}
    }

    #[test]
    fn test_background_task_runs_on_every_start() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = BackgroundTask::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(task.is_stopped());
        assert_eq!(task.duration(), Duration::ZERO);
        task.start();
        task.start();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_visibility_toggle() {
        let hidden = SharedValue::new(false);
        let toggle = VisibilityToggle::new(&hidden);
        toggle.start();
        assert!(hidden.get());
        toggle.start();
        assert!(!hidden.get());
        assert!(toggle.is_stopped());
    }

    #[test]
    fn test_pause_toggle() {
        let clock = Arc::new(VirtualClock::new(Arc::new(ManualTime::new())));
        let tween = Arc::new(Tween::with_clock(clock, Nop, Duration::from_secs(1)));
        tween.start();

        let toggle = PauseToggle::new(tween.clone());
        toggle.start();
        assert!(tween.is_stopped());
        toggle.start();
        assert!(!tween.is_stopped());
    }
}
