//! Timelines
//!
//! A timeline launches task sets at fixed offsets from its own start and
//! then forgets about them. Entries are kept sorted by offset; adding tasks
//! at an offset that already exists extends that entry.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::clock::{Timestamp, VirtualClock};
use crate::scheduler::AnimationController;
use crate::task::{Animation, Task, TaskRef, TimingState};

struct Entry {
    offset: Duration,
    tasks: SmallVec<[TaskRef; 4]>,
}

struct TimelineState {
    timing: TimingState,
    entries: Vec<Entry>,
    /// Next entry to fire
    cursor: usize,
}

impl TimelineState {
    fn window(&self) -> Duration {
        self.entries
            .last()
            .map_or(Duration::ZERO, |entry| entry.offset)
            .max(self.timing.duration)
    }
}

/// Launches tasks at offsets from its start
pub struct Timeline {
    clock: Arc<VirtualClock>,
    state: Mutex<TimelineState>,
}

impl Timeline {
    /// Create and register a timeline
    ///
    /// `duration` is a minimum; with zero the timeline lasts until its last
    /// entry.
    pub fn new(ctrl: &AnimationController, duration: Duration) -> Arc<Self> {
        let timeline = Arc::new(Self::with_clock(Arc::clone(ctrl.clock()), duration));
        ctrl.add(timeline.clone());
        timeline
    }

    pub(crate) fn with_clock(clock: Arc<VirtualClock>, duration: Duration) -> Self {
        Self {
            clock,
            state: Mutex::new(TimelineState {
                timing: TimingState::new(duration),
                entries: Vec::new(),
                cursor: 0,
            }),
        }
    }

    /// Launch `tasks` at `offset` after the timeline starts
    pub fn add(&self, offset: Duration, tasks: Vec<TaskRef>) {
        let mut state = self.state.lock();
        let idx = state.entries.partition_point(|entry| entry.offset < offset);
        match state.entries.get_mut(idx) {
            Some(entry) if entry.offset == offset => entry.tasks.extend(tasks),
            _ => state.entries.insert(
                idx,
                Entry {
                    offset,
                    tasks: tasks.into_iter().collect(),
                },
            ),
        }
    }

    pub fn set_repeat_count(&self, count: i32) {
        self.state.lock().timing.repeat_count = count;
    }

    /// Sorted list of distinct offsets
    pub fn offsets(&self) -> Vec<Duration> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|entry| entry.offset)
            .collect()
    }
}

impl Task for Timeline {
    fn start(&self) {
        let mut state = self.state.lock();
        if state.timing.running {
            return;
        }
        let window = state.window();
        state.timing.arm(self.clock.now(), window);
        state.cursor = 0;
    }

    fn is_stopped(&self) -> bool {
        !self.state.lock().timing.running
    }

    /// Largest offset, or the explicit duration if larger
    fn duration(&self) -> Duration {
        self.state.lock().window()
    }
}

impl Animation for Timeline {
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

        if state.cursor >= state.entries.len() {
            if t > state.timing.end {
                if !state.timing.next_cycle() {
                    tracing::trace!(at = %t, "timeline finished");
                    return false;
                }
                let window = state.window();
                state.timing.rearm(window);
                state.cursor = 0;
            }
            return true;
        }

        let elapsed = t - state.timing.start;
        let entry = &state.entries[state.cursor];
        if elapsed >= entry.offset {
            for task in &entry.tasks {
                task.start();
            }
            state.cursor += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTime;
    use crate::instant::BackgroundTask;
    use parking_lot::Mutex as PlMutex;

    fn setup() -> Arc<VirtualClock> {
        Arc::new(VirtualClock::new(Arc::new(ManualTime::new())))
    }

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn recorder(log: &Arc<PlMutex<Vec<&'static str>>>, name: &'static str) -> TaskRef {
        let log = Arc::clone(log);
        BackgroundTask::new(move || log.lock().push(name))
    }

    #[test]
    fn test_entries_sorted_and_merged() {
        let timeline = Timeline::with_clock(setup(), Duration::ZERO);
        let log = Arc::new(PlMutex::new(Vec::new()));
        timeline.add(ms(500), vec![recorder(&log, "b")]);
        timeline.add(ms(100), vec![recorder(&log, "a")]);
        timeline.add(ms(500), vec![recorder(&log, "c")]);
        assert_eq!(timeline.offsets(), vec![ms(100), ms(500)]);
        assert_eq!(timeline.duration(), ms(500));
    }

    #[test]
    fn test_explicit_duration_is_minimum() {
        let timeline = Timeline::with_clock(setup(), Duration::from_secs(2));
        timeline.add(ms(500), Vec::new());
        assert_eq!(timeline.duration(), Duration::from_secs(2));
        timeline.add(Duration::from_secs(3), Vec::new());
        assert_eq!(timeline.duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_fires_each_entry_once_per_cycle() {
        let timeline = Timeline::with_clock(setup(), Duration::from_secs(1));
        let log = Arc::new(PlMutex::new(Vec::new()));
        timeline.add(ms(0), vec![recorder(&log, "start")]);
        timeline.add(ms(500), vec![recorder(&log, "mid"), recorder(&log, "mid2")]);
        timeline.set_repeat_count(1);

        timeline.start();
        let mut t = 0.0;
        while timeline.update(at(t)) {
            t += 0.1;
        }
        assert_eq!(
            *log.lock(),
            vec!["start", "mid", "mid2", "start", "mid", "mid2"]
        );
    }

    #[test]
    fn test_one_entry_per_update() {
        let timeline = Timeline::with_clock(setup(), Duration::ZERO);
        let log = Arc::new(PlMutex::new(Vec::new()));
        timeline.add(ms(100), vec![recorder(&log, "a")]);
        timeline.add(ms(200), vec![recorder(&log, "b")]);

        timeline.start();
        timeline.update(at(5.0));
        assert_eq!(*log.lock(), vec!["a"]);
        timeline.update(at(5.0));
        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert!(!timeline.update(at(5.0)));
    }

    #[test]
    fn test_empty_timeline_runs_its_window() {
        let timeline = Timeline::with_clock(setup(), Duration::from_secs(1));
        timeline.start();
        assert!(timeline.update(at(0.9)));
        assert!(!timeline.update(at(1.1)));
    }

    #[test]
    fn test_pause_shifts_offsets() {
        let time = Arc::new(ManualTime::new());
        let clock = Arc::new(VirtualClock::new(time.clone()));
        let timeline = Timeline::with_clock(clock, Duration::ZERO);
        let log = Arc::new(PlMutex::new(Vec::new()));
        timeline.add(ms(500), vec![recorder(&log, "a")]);
        timeline.start();

        time.set(ms(200));
        timeline.stop();
        assert!(timeline.is_stopped());
        // due by wall time, but the timeline is paused
        assert!(!timeline.update(at(0.8)));
        assert!(log.lock().is_empty());
        time.set(ms(1200));
        timeline.resume();

        // offset 500ms now falls at 1.5s
        assert!(timeline.update(at(1.3)));
        assert!(log.lock().is_empty());
        assert!(timeline.update(at(1.6)));
        assert_eq!(*log.lock(), vec!["a"]);
    }

    #[test]
    fn test_second_start_keeps_cursor_and_window() {
        let time = Arc::new(ManualTime::new());
        let clock = Arc::new(VirtualClock::new(time.clone()));
        let timeline = Timeline::with_clock(clock, Duration::ZERO);
        let log = Arc::new(PlMutex::new(Vec::new()));
        timeline.add(ms(100), vec![recorder(&log, "a")]);
        timeline.add(ms(500), vec![recorder(&log, "b")]);

        timeline.start();
        timeline.update(at(0.2));
        time.set(ms(300));
        timeline.start();
        {
            let state = timeline.state.lock();
            assert_eq!(state.timing.start, at(0.0));
            assert_eq!(state.timing.end, at(0.5));
            assert_eq!(state.cursor, 1);
        }
        timeline.update(at(0.35));
        assert_eq!(*log.lock(), vec!["a"]);
    }
}
