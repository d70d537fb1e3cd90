//! Parallel groups
//!
//! A group starts all of its tasks at once and is done when every task has
//! stopped and its own window has elapsed. Its window is the longest task
//! duration or an explicit duration, whichever is larger.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::{Timestamp, VirtualClock};
use crate::error::{AnimationError, Result};
use crate::scheduler::AnimationController;
use crate::task::{Animation, Task, TaskRef, TimingState};

struct GroupState {
    timing: TimingState,
    tasks: Vec<TaskRef>,
}

impl GroupState {
    fn window(&self) -> Duration {
        self.tasks
            .iter()
            .map(|task| task.duration())
            .fold(self.timing.duration, Duration::max)
    }

    fn start_all(&self) {
        for task in &self.tasks {
            task.start();
        }
    }
}

/// Runs tasks in parallel
pub struct Group {
    clock: Arc<VirtualClock>,
    state: Mutex<GroupState>,
}

impl Group {
    /// Create and register a group; fails if `tasks` is empty
    pub fn new(ctrl: &AnimationController, tasks: Vec<TaskRef>) -> Result<Arc<Self>> {
        let group = Arc::new(Self::with_clock(Arc::clone(ctrl.clock()), tasks)?);
        ctrl.add(group.clone());
        Ok(group)
    }

    pub(crate) fn with_clock(clock: Arc<VirtualClock>, tasks: Vec<TaskRef>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(AnimationError::EmptyGroup);
        }
        Ok(Self {
            clock,
            state: Mutex::new(GroupState {
                timing: TimingState::default(),
                tasks,
            }),
        })
    }

    /// Add a task; it is launched with the next (re)start
    pub fn add(&self, task: TaskRef) {
        self.state.lock().tasks.push(task);
    }

    /// Additional runs after the first; negative repeats forever
    pub fn set_repeat_count(&self, count: i32) {
        self.state.lock().timing.repeat_count = count;
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tasks.is_empty()
    }
}

impl Task for Group {
    fn start(&self) {
        let mut state = self.state.lock();
        if state.timing.running {
            return;
        }
        let window = state.window();
        state.timing.arm(self.clock.now(), window);
        state.start_all();
    }

    fn is_stopped(&self) -> bool {
        !self.state.lock().timing.running
    }

    fn duration(&self) -> Duration {
        self.state.lock().window()
    }
}

impl Animation for Group {
    /// Explicit minimum window
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
        if state.tasks.iter().any(|task| !task.is_stopped()) {
            return true;
        }
        if t > state.timing.end {
            if !state.timing.next_cycle() {
                tracing::trace!(at = %t, "group finished");
                return false;
            }
            let window = state.window();
            state.timing.rearm(window);
            state.start_all();
        }
        true
    }
}
