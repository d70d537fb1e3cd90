//! Animation controller
//!
//! Owns the registry of top-level animations and the virtual clock, and
//! drives every registered animation at a fixed period:
//!
//! 1. pin one virtual instant for the whole pass
//! 2. fan the registry out to a pool of long-lived update workers, worker
//!    `id` handling indices `id, id + n, id + 2n, …`
//! 3. wait for every worker (barrier)
//! 4. call the render callback, then the send callback
//!
//! Passes run either on the controller's background ticker thread
//! (`start_background()`) or on the caller's thread via `tick()`; they never
//! overlap.
//!
//! ```ignore
//! let ctrl = AnimationController::new(ControllerConfig::default())?;
//! ctrl.set_render_callback(move || canvas.draw(&grid));
//! ctrl.set_send_callback(move || client.send(&grid));
//! ctrl.start_background()?;
//!
//! let angle = SharedValue::new(0.0);
//! let spin = FloatTween::new(&ctrl, &angle, 360.0, Duration::from_secs(2));
//! spin.set_repeat_count(-1);
//! spin.start();
//! ```

use std::any::Any;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use tracing::{debug, error, trace, warn};

use crate::clock::{MonotonicTime, TimeSource, Timestamp, VirtualClock};
use crate::config::ControllerConfig;
use crate::error::{AnimationError, Result};
use crate::task::{identity, Animation, AnimationRef, Task};

/// Callback invoked once per pass after all animations are updated
///
/// Called from the thread running the pass (the ticker thread or the caller
/// of `tick()`).
pub type FrameCallback = Arc<dyn Fn() + Send + Sync>;

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
struct Registry {
    list: Vec<AnimationRef>,
    /// Identities of everything in `list`
    index: FxHashSet<usize>,
}

impl Registry {
    fn insert(&mut self, anim: AnimationRef) -> bool {
        if !self.index.insert(identity(&anim)) {
            return false;
        }
        self.list.push(anim);
        true
    }

    fn position(&self, id: usize) -> Option<usize> {
        if !self.index.contains(&id) {
            return None;
        }
        self.list.iter().position(|anim| identity(anim) == id)
    }

    fn remove_at(&mut self, pos: usize) -> AnimationRef {
        let anim = self.list.remove(pos);
        self.index.remove(&identity(&anim));
        anim
    }

    fn clear(&mut self) -> Vec<AnimationRef> {
        self.index.clear();
        mem::take(&mut self.list)
    }
}

// ============================================================================
// Tick Statistics
// ============================================================================

/// Timing of the update phase of past passes (render and send excluded)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickStats {
    /// Passes run so far
    pub passes: u64,
    /// Animations updated in the last pass
    pub last_updated: usize,
    pub last: Duration,
    pub min: Duration,
    pub max: Duration,
    pub total: Duration,
    /// Passes whose update phase exceeded the refresh period
    pub slow_passes: u64,
}

impl TickStats {
    fn record(&mut self, elapsed: Duration, updated: usize, slow: bool) {
        self.min = if self.passes == 0 {
            elapsed
        } else {
            self.min.min(elapsed)
        };
        self.passes += 1;
        self.last_updated = updated;
        self.last = elapsed;
        self.max = self.max.max(elapsed);
        self.total += elapsed;
        if slow {
            self.slow_passes += 1;
        }
    }

    /// Mean update time per pass
    pub fn average(&self) -> Duration {
        if self.passes == 0 {
            return Duration::ZERO;
        }
        self.total / self.passes as u32
    }
}

// ============================================================================
// Worker Pool
// ============================================================================

struct PassJob {
    /// Partition handled by this job
    id: usize,
    workers: usize,
    at: Timestamp,
}

struct WorkerReport {
    updated: usize,
    panic: Option<Box<dyn Any + Send>>,
}

struct Pool {
    begin: Sender<PassJob>,
    done: Receiver<WorkerReport>,
    workers: usize,
}

fn update_partition(registry: &RwLock<Registry>, job: &PassJob) -> usize {
    // recursive: the pass already holds a shared guard, a queued writer must
    // not block the workers behind it
    let registry = registry.read_recursive();
    let mut updated = 0;
    for anim in registry.list.iter().skip(job.id).step_by(job.workers) {
        if anim.is_stopped() {
            continue;
        }
        anim.update(job.at);
        updated += 1;
    }
    updated
}

fn worker_loop(
    id: usize,
    registry: Arc<RwLock<Registry>>,
    begin: Receiver<PassJob>,
    done: Sender<WorkerReport>,
) {
    debug!(worker = id, "update worker started");
    for job in begin.iter() {
        let report = match panic::catch_unwind(AssertUnwindSafe(|| {
            update_partition(&registry, &job)
        })) {
            Ok(updated) => WorkerReport {
                updated,
                panic: None,
            },
            Err(payload) => WorkerReport {
                updated: 0,
                panic: Some(payload),
            },
        };
        if done.send(report).is_err() {
            break;
        }
    }
    debug!(worker = id, "update worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

// ============================================================================
// Shared Controller State
// ============================================================================

struct Shared {
    registry: Arc<RwLock<Registry>>,
    clock: Arc<VirtualClock>,
    /// `None` once the controller shuts down; also serializes passes
    pool: Mutex<Option<Pool>>,
    render: RwLock<Option<FrameCallback>>,
    send: RwLock<Option<FrameCallback>>,
    stats: Mutex<TickStats>,
    config: ControllerConfig,
}

impl Shared {
    fn add(&self, anim: AnimationRef) -> bool {
        let added = self.registry.write().insert(anim);
        if added {
            trace!("animation registered");
        }
        added
    }

    fn del(&self, id: usize) -> bool {
        let mut registry = self.registry.write();
        let Some(pos) = registry.position(id) else {
            return false;
        };
        registry.list[pos].stop();
        registry.remove_at(pos);
        trace!("animation removed");
        true
    }

    fn run_pass(&self) -> bool {
        if self.clock.is_stopped() {
            return false;
        }
        let guard = self.pool.lock();
        let Some(pool) = guard.as_ref() else {
            return false;
        };

        let registry = self.registry.read();
        let at = self.clock.now();
        let started = Instant::now();

        for id in 0..pool.workers {
            let job = PassJob {
                id,
                workers: pool.workers,
                at,
            };
            if pool.begin.send(job).is_err() {
                error!("update workers are gone");
                return false;
            }
        }

        let mut updated = 0;
        let mut failure = None;
        for _ in 0..pool.workers {
            match pool.done.recv() {
                Ok(report) => {
                    updated += report.updated;
                    if failure.is_none() {
                        failure = report.panic;
                    }
                }
                Err(_) => break,
            }
        }
        let registered = registry.list.len();
        drop(registry);
        let elapsed = started.elapsed();

        if let Some(payload) = failure {
            error!(at = %at, "animation update panicked: {}", panic_message(&*payload));
            drop(guard);
            panic::resume_unwind(payload);
        }

        let slow = elapsed > self.config.refresh_rate();
        self.stats.lock().record(elapsed, updated, slow);
        trace!(at = %at, updated, registered, ?elapsed, "update pass");
        if slow && self.config.slow_tick_warning {
            warn!(
                "Update pass took {:.2}ms (refresh period {}ms, {} animations)",
                elapsed.as_secs_f64() * 1000.0,
                self.config.refresh_rate_ms,
                updated
            );
        }

        let render = self.render.read().clone();
        if let Some(render) = render {
            render();
        }
        let send = self.send.read().clone();
        if let Some(send) = send {
            send();
        }
        true
    }
}

// ============================================================================
// Animation Controller
// ============================================================================

struct Ticker {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// Schedules and updates all registered animations
///
/// Animation constructors take the controller, register the new animation
/// and share the controller's clock with it. Dropping the controller stops
/// the ticker and joins every worker.
pub struct AnimationController {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    ticker: Mutex<Option<Ticker>>,
}

impl AnimationController {
    /// Controller running on monotonic system time
    pub fn new(config: ControllerConfig) -> Result<Self> {
        Self::with_time_source(config, Arc::new(MonotonicTime::new()))
    }

    /// Controller running on an arbitrary time source
    pub fn with_time_source(config: ControllerConfig, source: Arc<dyn TimeSource>) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(RwLock::new(Registry::default()));
        let (begin_tx, begin_rx) = bounded::<PassJob>(config.workers);
        let (done_tx, done_rx) = bounded::<WorkerReport>(config.workers);

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let name = format!("ledgrid-worker-{id}");
            let registry = Arc::clone(&registry);
            let begin = begin_rx.clone();
            let done = done_tx.clone();
            let handle = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker_loop(id, registry, begin, done))
                .map_err(|source| AnimationError::Spawn { name, source })?;
            workers.push(handle);
        }

        debug!(
            workers = config.workers,
            refresh_rate_ms = config.refresh_rate_ms,
            "animation controller created"
        );

        let shared = Arc::new(Shared {
            registry,
            clock: Arc::new(VirtualClock::new(source)),
            pool: Mutex::new(Some(Pool {
                begin: begin_tx,
                done: done_rx,
                workers: config.workers,
            })),
            render: RwLock::new(None),
            send: RwLock::new(None),
            stats: Mutex::new(TickStats::default()),
            config,
        });

        Ok(Self {
            shared,
            workers,
            ticker: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.shared.config
    }

    /// The clock shared with every animation of this controller
    pub fn clock(&self) -> &Arc<VirtualClock> {
        &self.shared.clock
    }

    /// Current virtual time
    pub fn now(&self) -> Timestamp {
        self.shared.clock.now()
    }

    /// Get a weak handle for code that must not keep the controller alive
    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Register an animation; returns false if it was already registered
    pub fn add(&self, anim: AnimationRef) -> bool {
        self.shared.add(anim)
    }

    pub fn add_all(&self, anims: impl IntoIterator<Item = AnimationRef>) {
        let mut registry = self.shared.registry.write();
        for anim in anims {
            registry.insert(anim);
        }
    }

    /// Stop and unregister an animation; returns false if it was not registered
    pub fn del<A: Animation + ?Sized>(&self, anim: &Arc<A>) -> bool {
        self.shared.del(identity(anim))
    }

    /// Stop and unregister every animation
    pub fn purge(&self) {
        let removed = self.shared.registry.write().clear();
        for anim in &removed {
            anim.stop();
        }
        debug!(count = removed.len(), "animations purged");
    }

    pub fn contains<A: Animation + ?Sized>(&self, anim: &Arc<A>) -> bool {
        self.shared.registry.read().index.contains(&identity(anim))
    }

    /// Number of registered animations
    pub fn len(&self) -> usize {
        self.shared.registry.read().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Global Pause
    // =========================================================================

    /// Freeze the clock and skip ticks until `resume()`
    pub fn stop(&self) {
        if self.shared.clock.stop() {
            debug!(at = %self.now(), "animation controller stopped");
        }
    }

    /// Continue after `stop()`; animations do not see the paused interval
    pub fn resume(&self) {
        if self.shared.clock.resume() {
            debug!(at = %self.now(), "animation controller resumed");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.clock.is_stopped()
    }

    // =========================================================================
    // Ticking
    // =========================================================================

    /// Run one update pass on the calling thread
    ///
    /// Returns false if the pass was skipped because the controller is
    /// stopped. Blocks while another pass is running. A panicking update is
    /// re-raised here.
    pub fn tick(&self) -> bool {
        self.shared.run_pass()
    }

    /// Start the background ticker thread at the configured refresh rate
    ///
    /// A ticker that died from a panicking update is replaced.
    pub fn start_background(&self) -> Result<()> {
        let mut ticker = self.ticker.lock();
        match ticker.take() {
            Some(running) if !running.handle.is_finished() => {
                *ticker = Some(running);
                return Ok(());
            }
            Some(dead) => {
                if dead.handle.join().is_err() {
                    warn!("restarting animation ticker after a panic");
                }
            }
            None => {}
        }

        let shared = Arc::clone(&self.shared);
        let period = shared.config.refresh_rate();
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let name = "ledgrid-ticker".to_string();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let ticks = crossbeam_channel::tick(period);
                debug!(?period, "animation ticker started");
                loop {
                    select! {
                        recv(ticks) -> _ => {
                            shared.run_pass();
                        }
                        recv(shutdown_rx) -> _ => break,
                    }
                }
                debug!("animation ticker stopped");
            })
            .map_err(|source| AnimationError::Spawn { name, source })?;

        *ticker = Some(Ticker {
            shutdown: shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// Stop the background ticker thread
    ///
    /// If the ticker died from a panicking update, the panic is re-raised.
    pub fn stop_background(&self) {
        if let Some(payload) = self.shutdown_ticker() {
            panic::resume_unwind(payload);
        }
    }

    /// False once the ticker was stopped or died from a panicking update
    pub fn is_background_running(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .map_or(false, |ticker| !ticker.handle.is_finished())
    }

    fn shutdown_ticker(&self) -> Option<Box<dyn Any + Send>> {
        let ticker = self.ticker.lock().take()?;
        // a full channel means a shutdown is already pending
        let _ = ticker.shutdown.try_send(());
        drop(ticker.shutdown);
        ticker.handle.join().err()
    }

    // =========================================================================
    // Frame Callbacks
    // =========================================================================

    /// Called after every pass, before the send callback
    pub fn set_render_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.shared.render.write() = Some(Arc::new(callback));
    }

    /// Called after every pass, after the render callback
    pub fn set_send_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.shared.send.write() = Some(Arc::new(callback));
    }

    /// Snapshot of the update pass timing
    pub fn stats(&self) -> TickStats {
        self.shared.stats.lock().clone()
    }
}

impl Drop for AnimationController {
    fn drop(&mut self) {
        if self.shutdown_ticker().is_some() {
            warn!("animation ticker had terminated with a panic");
        }
        // dropping the pool closes the begin channel, ending every worker
        self.shared.pool.lock().take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
        debug!("animation controller shut down");
    }
}

// ============================================================================
// Controller Handle
// ============================================================================

/// Weak reference to a controller
///
/// All operations are no-ops once the controller is dropped.
#[derive(Clone)]
pub struct ControllerHandle {
    shared: Weak<Shared>,
}

impl ControllerHandle {
    /// Register an animation; false if already registered or the controller is gone
    pub fn add(&self, anim: AnimationRef) -> bool {
        self.shared
            .upgrade()
            .map(|shared| shared.add(anim))
            .unwrap_or(false)
    }

    pub fn del<A: Animation + ?Sized>(&self, anim: &Arc<A>) -> bool {
        self.shared
            .upgrade()
            .map(|shared| shared.del(identity(anim)))
            .unwrap_or(false)
    }

    /// Current virtual time, if the controller is still alive
    pub fn now(&self) -> Option<Timestamp> {
        self.shared.upgrade().map(|shared| shared.clock.now())
    }

    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTime;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts updates; optionally panics
    #[derive(Default)]
    struct Probe {
        updates: AtomicUsize,
        stopped: AtomicBool,
        explode: bool,
    }

    impl Task for Probe {
        fn start(&self) {
            self.stopped.store(false, Ordering::SeqCst);
        }

        fn is_stopped(&self) -> bool {
            self.stopped.load(Ordering::SeqCst)
        }

        fn duration(&self) -> Duration {
            Duration::ZERO
        }
    }

    impl Animation for Probe {
        fn set_duration(&self, _duration: Duration) {}

        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }

        fn resume(&self) {
            self.stopped.store(false, Ordering::SeqCst);
        }

        fn update(&self, _t: Timestamp) -> bool {
            if self.explode {
                panic!("boom");
            }
            self.updates.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    fn controller(workers: usize) -> (Arc<ManualTime>, AnimationController) {
        let time = Arc::new(ManualTime::new());
        let config = ControllerConfig::default().with_workers(workers);
        let ctrl = AnimationController::with_time_source(config, time.clone()).unwrap();
        (time, ctrl)
    }

    #[test]
    fn test_add_is_deduplicated() {
        let (_time, ctrl) = controller(2);
        let probe = Arc::new(Probe::default());
        assert!(ctrl.add(probe.clone()));
        assert!(!ctrl.add(probe.clone()));
        assert_eq!(ctrl.len(), 1);
        assert!(ctrl.contains(&probe));
    }

    #[test]
    fn test_del_stops_and_is_idempotent() {
        let (_time, ctrl) = controller(2);
        let a = Arc::new(Probe::default());
        let b = Arc::new(Probe::default());
        ctrl.add_all([a.clone() as AnimationRef, b.clone() as AnimationRef]);

        assert!(ctrl.del(&a));
        assert!(a.is_stopped());
        assert!(!ctrl.del(&a));
        assert!(!ctrl.contains(&a));
        assert!(ctrl.contains(&b));
        assert!(!b.is_stopped());
    }

    #[test]
    fn test_purge_stops_everything() {
        let (_time, ctrl) = controller(2);
        let probes: Vec<_> = (0..5).map(|_| Arc::new(Probe::default())).collect();
        for probe in &probes {
            ctrl.add(probe.clone());
        }
        ctrl.purge();
        assert!(ctrl.is_empty());
        assert!(probes.iter().all(|p| p.is_stopped()));
    }

    #[test]
    fn test_tick_updates_running_animations_only() {
        let (_time, ctrl) = controller(3);
        let running = Arc::new(Probe::default());
        let paused = Arc::new(Probe::default());
        paused.stop();
        ctrl.add(running.clone());
        ctrl.add(paused.clone());

        assert!(ctrl.tick());
        assert!(ctrl.tick());
        assert_eq!(running.updates.load(Ordering::SeqCst), 2);
        assert_eq!(paused.updates.load(Ordering::SeqCst), 0);
        assert_eq!(ctrl.stats().passes, 2);
        assert_eq!(ctrl.stats().last_updated, 1);
    }

    #[test]
    fn test_every_index_updated_once_per_pass() {
        for workers in [1, 2, 3, 8] {
            let (_time, ctrl) = controller(workers);
            let probes: Vec<_> = (0..37).map(|_| Arc::new(Probe::default())).collect();
            for probe in &probes {
                ctrl.add(probe.clone());
            }
            for _ in 0..4 {
                ctrl.tick();
            }
            assert!(probes
                .iter()
                .all(|p| p.updates.load(Ordering::SeqCst) == 4));
        }
    }

    #[test]
    fn test_render_then_send() {
        let (_time, ctrl) = controller(2);
        let log = Arc::new(Mutex::new(Vec::new()));
        let render_log = Arc::clone(&log);
        let send_log = Arc::clone(&log);
        ctrl.set_send_callback(move || send_log.lock().push("send"));
        ctrl.set_render_callback(move || render_log.lock().push("render"));

        ctrl.tick();
        ctrl.tick();
        assert_eq!(*log.lock(), vec!["render", "send", "render", "send"]);
    }

    #[test]
    fn test_stopped_controller_skips_ticks() {
        let (time, ctrl) = controller(2);
        let probe = Arc::new(Probe::default());
        ctrl.add(probe.clone());
        let frames = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&frames);
        ctrl.set_render_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        time.advance(Duration::from_secs(1));
        ctrl.stop();
        assert!(ctrl.is_stopped());
        time.advance(Duration::from_secs(3));
        assert_eq!(ctrl.now(), Timestamp::from_secs_f64(1.0));
        assert!(!ctrl.tick());
        assert_eq!(probe.updates.load(Ordering::SeqCst), 0);
        assert_eq!(frames.load(Ordering::SeqCst), 0);

        ctrl.resume();
        assert_eq!(ctrl.now(), Timestamp::from_secs_f64(1.0));
        assert!(ctrl.tick());
        assert_eq!(frames.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_update_panic_is_fatal() {
        let (_time, ctrl) = controller(2);
        ctrl.add(Arc::new(Probe {
            explode: true,
            ..Default::default()
        }));
        ctrl.tick();
    }

    #[test]
    fn test_handle_is_weak() {
        let (_time, ctrl) = controller(1);
        let handle = ctrl.handle();
        let probe = Arc::new(Probe::default());
        assert!(handle.add(probe.clone()));
        assert!(handle.is_alive());
        assert!(handle.now().is_some());
        assert!(handle.del(&probe));

        drop(ctrl);
        assert!(!handle.is_alive());
        assert!(!handle.add(probe.clone()));
        assert!(handle.now().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ControllerConfig::default().with_workers(0);
        assert!(matches!(
            AnimationController::new(config),
            Err(AnimationError::Config(_))
        ));
    }

    #[test]
    fn test_stats_average() {
        let mut stats = TickStats::default();
        stats.record(Duration::from_millis(2), 3, false);
        stats.record(Duration::from_millis(4), 5, true);
        assert_eq!(stats.min, Duration::from_millis(2));
        assert_eq!(stats.max, Duration::from_millis(4));
        assert_eq!(stats.average(), Duration::from_millis(3));
        assert_eq!(stats.last_updated, 5);
        assert_eq!(stats.slow_passes, 1);
    }
}
