//! Per-pixel shader animation
//!
//! A shader animation belongs to one pixel at `(x, y)`. Every tick it feeds
//! `(x, y, seconds since start)` into a shader function and looks the result
//! up in a palette. It never finishes on its own.

use std::sync::Arc;
use std::time::Duration;

use ledgrid_core::{LedColor, SharedValue};
use parking_lot::Mutex;

use crate::clock::{Timestamp, VirtualClock};
use crate::scheduler::AnimationController;
use crate::source::PaletteRef;
use crate::task::{Animation, Task, TimingState};

/// Shader function `(x, y, t) -> palette position`
pub type ShaderFn = Arc<dyn Fn(f64, f64, f64) -> f64 + Send + Sync>;

/// Endless animation of one pixel color
pub struct ShaderAnimation {
    clock: Arc<VirtualClock>,
    cell: SharedValue<LedColor>,
    palette: PaletteRef,
    x: f64,
    y: f64,
    shader: ShaderFn,
    timing: Mutex<TimingState>,
}

impl ShaderAnimation {
    pub fn new(
        ctrl: &AnimationController,
        cell: &SharedValue<LedColor>,
        palette: PaletteRef,
        x: f64,
        y: f64,
        shader: ShaderFn,
    ) -> Arc<Self> {
        let anim = Arc::new(Self::with_clock(
            Arc::clone(ctrl.clock()),
            cell,
            palette,
            (x, y),
            shader,
        ));
        ctrl.add(anim.clone());
        anim
    }

    pub(crate) fn with_clock(
        clock: Arc<VirtualClock>,
        cell: &SharedValue<LedColor>,
        palette: PaletteRef,
        (x, y): (f64, f64),
        shader: ShaderFn,
    ) -> Self {
        Self {
            clock,
            cell: cell.clone(),
            palette,
            x,
            y,
            shader,
            timing: Mutex::new(TimingState::default()),
        }
    }
}

impl Task for ShaderAnimation {
    fn start(&self) {
        let mut timing = self.timing.lock();
        if timing.running {
            return;
        }
        timing.arm(self.clock.now(), Duration::ZERO);
    }

    fn is_stopped(&self) -> bool {
        !self.timing.lock().running
    }

    fn duration(&self) -> Duration {
        Duration::ZERO
    }
}

impl Animation for ShaderAnimation {
    /// Shaders are endless; the duration is ignored
    fn set_duration(&self, _duration: Duration) {}

    fn stop(&self) {
        self.timing.lock().pause(self.clock.now());
    }

    fn resume(&self) {
        self.timing.lock().unpause(self.clock.now());
    }

    fn update(&self, t: Timestamp) -> bool {
        let start = self.timing.lock().start;
        let elapsed = (t - start).as_secs_f64();
        let pos = (self.shader)(self.x, self.y, elapsed);
        self.cell.set(self.palette.color(pos));
        true
    }
}
