//! Ordered sequences
//!
//! A sequence starts its tasks one after another: the next task is launched
//! on the first update after the current one has stopped.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::{Timestamp, VirtualClock};
use crate::error::{AnimationError, Result};
use crate::scheduler::AnimationController;
use crate::task::{Animation, Task, TaskRef, TimingState};

struct SequenceState {
    timing: TimingState,
    tasks: Vec<TaskRef>,
    current: usize,
}

impl SequenceState {
    fn window(&self) -> Duration {
        self.tasks
            .iter()
            .map(|task| task.duration())
            .fold(Duration::ZERO, Duration::saturating_add)
            .max(self.timing.duration)
    }

    fn restart(&mut self) {
        self.current = 0;
        if let Some(first) = self.tasks.first() {
            first.start();
        }
    }
}

/// Runs tasks one after another
pub struct Sequence {
    clock: Arc<VirtualClock>,
    state: Mutex<SequenceState>,
}

impl Sequence {
    /// Create and register a sequence; fails if `tasks` is empty
    pub fn new(ctrl: &AnimationController, tasks: Vec<TaskRef>) -> Result<Arc<Self>> {
        let sequence = Arc::new(Self::with_clock(Arc::clone(ctrl.clock()), tasks)?);
        ctrl.add(sequence.clone());
        Ok(sequence)
    }

    pub(crate) fn with_clock(clock: Arc<VirtualClock>, tasks: Vec<TaskRef>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(AnimationError::EmptySequence);
        }
        Ok(Self {
            clock,
            state: Mutex::new(SequenceState {
                timing: TimingState::default(),
                tasks,
                current: 0,
            }),
        })
    }

    /// Append a task to the end of the sequence
    pub fn add(&self, task: TaskRef) {
        self.state.lock().tasks.push(task);
    }

    pub fn set_repeat_count(&self, count: i32) {
        self.state.lock().timing.repeat_count = count;
    }

    /// Index of the task currently running
    pub fn current(&self) -> usize {
        self.state.lock().current
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }
}

impl Task for Sequence {
    fn start(&self) {
        let mut state = self.state.lock();
        if state.timing.running {
            return;
        }
        let window = state.window();
        state.timing.arm(self.clock.now(), window);
        state.restart();
    }

    fn is_stopped(&self) -> bool {
        !self.state.lock().timing.running
    }

    /// Sum of all task durations
    fn duration(&self) -> Duration {
        self.state.lock().window()
    }
}

impl Animation for Sequence {
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
        let mut state = self.state.lock();
        if !state.timing.running {
            return false;
        }

        if state.current < state.tasks.len() {
            if !state.tasks[state.current].is_stopped() {
                return true;
            }
            state.current += 1;
        }

        if state.current >= state.tasks.len() {
            if t > state.timing.end {
                if !state.timing.next_cycle() {
                    tracing::trace!(at = %t, "sequence finished");
                    return false;
                }
                let window = state.window();
                state.timing.rearm(window);
                state.restart();
            }
            return true;
        }

        state.tasks[state.current].start();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTime;
    use crate::instant::BackgroundTask;
    use crate::tween::{Tween, TweenKind};
    use parking_lot::Mutex as PlMutex;

    struct Nop;

    impl TweenKind for Nop {
        fn tick(&mut self, _t: f64) {}
    }

    fn setup() -> Arc<VirtualClock> {
        Arc::new(VirtualClock::new(Arc::new(ManualTime::new())))
    }

    fn tween(clock: &Arc<VirtualClock>, secs: u64) -> Arc<Tween<Nop>> {
        Arc::new(Tween::with_clock(
            Arc::clone(clock),
            Nop,
            Duration::from_secs(secs),
        ))
    }

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(matches!(
            Sequence::with_clock(setup(), Vec::new()),
            Err(AnimationError::EmptySequence)
        ));
    }

    #[test]
    fn test_duration_is_sum() {
        let clock = setup();
        let a = tween(&clock, 1);
        let b = tween(&clock, 2);
        b.set_auto_reverse(true);
        let seq = Sequence::with_clock(Arc::clone(&clock), crate::tasks![a, b]).unwrap();
        assert_eq!(seq.duration(), Duration::from_secs(5));
        seq.add(tween(&clock, 3));
        assert_eq!(seq.duration(), Duration::from_secs(8));
    }

    #[test]
    fn test_runs_tasks_in_order() {
        let clock = setup();
        let log = Arc::new(PlMutex::new(Vec::new()));
        let step = |name: &'static str| {
            let log = Arc::clone(&log);
            BackgroundTask::new(move || log.lock().push(name))
        };
        let (a, b, c) = (step("a"), step("b"), step("c"));
        let seq = Sequence::with_clock(Arc::clone(&clock), crate::tasks![a, b, c]).unwrap();

        seq.start();
        assert_eq!(*log.lock(), vec!["a"]);
        seq.update(at(0.0));
        assert_eq!(*log.lock(), vec!["a", "b"]);
        seq.update(at(0.0));
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_waits_for_running_task() {
        let clock = setup();
        let a = tween(&clock, 1);
        let b = tween(&clock, 1);
        let seq = Sequence::with_clock(Arc::clone(&clock), crate::tasks![a, b]).unwrap();

        seq.start();
        assert!(!a.is_stopped());
        assert!(seq.update(at(0.5)));
        assert!(b.is_stopped());
        assert_eq!(seq.current(), 0);

        assert!(!a.update(at(1.1)));
        assert!(seq.update(at(1.1)));
        assert_eq!(seq.current(), 1);
        assert!(!b.is_stopped());

        assert!(!b.update(at(2.2)));
        // last task done, sequence window [0, 2] elapsed
        assert!(!seq.update(at(2.2)));
    }

    #[test]
    fn test_repeat_restarts_from_first() {
        let clock = setup();
        let log = Arc::new(PlMutex::new(Vec::new()));
        let first = {
            let log = Arc::clone(&log);
            BackgroundTask::new(move || log.lock().push(1))
        };
        let seq = Sequence::with_clock(Arc::clone(&clock), crate::tasks![first]).unwrap();
        seq.set_duration(Duration::from_secs(1));
        seq.set_repeat_count(1);

        seq.start();
        let mut t = 0.0;
        while seq.update(at(t)) {
            t += 0.5;
        }
        assert_eq!(log.lock().len(), 2);
    }

    fn manual() -> (Arc<ManualTime>, Arc<VirtualClock>) {
        let time = Arc::new(ManualTime::new());
        let clock = Arc::new(VirtualClock::new(time.clone()));
        (time, clock)
    }

    #[test]
    fn test_duration_saturates() {
        let clock = setup();
        let a = tween(&clock, 1);
        a.set_repeat_count(i32::MAX);
        a.set_auto_reverse(true);
        let b = tween(&clock, 1);
        let seq = Sequence::with_clock(Arc::clone(&clock), crate::tasks![a, b]).unwrap();
        assert_eq!(seq.duration(), Duration::MAX);

        seq.start();
        assert!(seq.update(at(10.0)));
    }

    #[test]
    fn test_pause_shifts_sequence_window() {
        let (time, clock) = manual();
        let only = BackgroundTask::new(|| {});
        let seq = Sequence::with_clock(Arc::clone(&clock), crate::tasks![only]).unwrap();
        seq.set_duration(Duration::from_secs(1));
        seq.start();

        time.set(Duration::from_millis(500));
        seq.stop();
        assert!(seq.is_stopped());
        assert!(!seq.update(at(0.6)));
        time.set(Duration::from_millis(2500));
        seq.resume();

        // window moved from [0, 1] to [2, 3]
        assert!(seq.update(at(1.5)));
        assert!(seq.update(at(2.9)));
        assert!(!seq.update(at(3.1)));
    }

    #[test]
    fn test_second_start_keeps_window() {
        let (time, clock) = manual();
        let log = Arc::new(PlMutex::new(Vec::new()));
        let first = {
            let log = Arc::clone(&log);
            BackgroundTask::new(move || log.lock().push("first"))
        };
        let seq = Sequence::with_clock(Arc::clone(&clock), crate::tasks![first]).unwrap();
        seq.set_duration(Duration::from_secs(1));

        seq.start();
        time.set(Duration::from_millis(500));
        seq.start();
        assert_eq!(log.lock().len(), 1);
        {
            let state = seq.state.lock();
            assert_eq!(state.timing.start, at(0.0));
            assert_eq!(state.timing.end, at(1.0));
        }
        assert!(!seq.update(at(1.1)));
    }
}
