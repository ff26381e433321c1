//! Frame scheduling primitives.
//!
//! A [`Scheduler`] holds callbacks that run once per display refresh with the
//! wall-clock delta since their previous invocation. A callback keeps running
//! until it returns [`Flow::Stop`] (or `false`); returning `()` or `true`
//! continues. Tasks can also be cancelled by id, which is the single
//! cancellation point for everything scheduled on a stage.
//!
//! [`Tween`] interpolates a scalar over a fixed duration and always finishes
//! exactly on its end value.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::math::lerp;

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// Whether a scheduled callback wants another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl From<()> for Flow {
    fn from(_: ()) -> Self {
        Flow::Continue
    }
}

impl From<bool> for Flow {
    fn from(keep_going: bool) -> Self {
        if keep_going { Flow::Continue } else { Flow::Stop }
    }
}

// ---------------------------------------------------------------------------
// FrameClock
// ---------------------------------------------------------------------------

/// Converts successive frame timestamps into deltas in seconds.
///
/// The first tick yields `0.0`; later ticks yield the time elapsed since the
/// previous one, never negative.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: Instant) -> f64 {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

type TaskFn<C> = Box<dyn FnMut(&mut C, f64) -> Flow>;

pub struct Task<C> {
    id: TaskId,
    run: TaskFn<C>,
}

/// Owns every per-frame callback for one context type `C`.
pub struct Scheduler<C> {
    tasks: Vec<Task<C>>,
    cancelled: Vec<TaskId>,
    next_id: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            cancelled: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` every frame until it signals stop.
    pub fn animate<F, R>(&mut self, mut f: F) -> TaskId
    where
        F: FnMut(&mut C, f64) -> R + 'static,
        R: Into<Flow>,
    {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            run: Box::new(move |cx, dt| f(cx, dt).into()),
        });
        id
    }

    /// Interpolate over `config.range`, calling `on_update` every frame.
    ///
    /// The returned [`Completion`] resolves on the frame that delivers the
    /// end value.
    pub fn tween<F>(&mut self, config: TweenConfig, mut on_update: F) -> (TaskId, Completion)
    where
        F: FnMut(&mut C, f64) + 'static,
    {
        let completion = Completion::default();
        let signal = completion.clone();
        let mut tween = Tween::new(config);

        let id = self.animate(move |cx: &mut C, dt| match tween.step(dt) {
            TweenStep::Running(value) => {
                on_update(cx, value);
                Flow::Continue
            }
            TweenStep::Finished(value) => {
                on_update(cx, value);
                signal.resolve();
                Flow::Stop
            }
        });

        (id, completion)
    }

    /// Cancel a pending task. Returns `false` if it already finished.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if let Some(pos) = self.tasks.iter().position(|t| t.id == id) {
            self.tasks.remove(pos);
            return true;
        }
        // The task may be out for a run right now; remember the request.
        if id.0 < self.next_id && !self.cancelled.contains(&id) {
            self.cancelled.push(id);
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Run every task once against `cx`.
    pub fn run(&mut self, cx: &mut C, dt: f64) {
        let mut tasks = self.take_tasks();
        tasks.retain_mut(|task| (task.run)(cx, dt) == Flow::Continue);
        self.restore_tasks(tasks);
    }

    /// Move the task list out so it can run against a context that owns this
    /// scheduler. Pair with [`Scheduler::restore_tasks`].
    pub fn take_tasks(&mut self) -> Vec<Task<C>> {
        self.cancelled.clear();
        std::mem::take(&mut self.tasks)
    }

    /// Whether `id` was cancelled while its task list was taken out.
    pub fn is_cancelled(&self, id: TaskId) -> bool {
        self.cancelled.contains(&id)
    }

    /// Put surviving tasks back ahead of any scheduled meanwhile, dropping
    /// those cancelled in between.
    pub fn restore_tasks(&mut self, mut survivors: Vec<Task<C>>) {
        let cancelled = std::mem::take(&mut self.cancelled);
        survivors.retain(|t| !cancelled.contains(&t.id));
        survivors.append(&mut self.tasks);
        self.tasks = survivors;
    }
}

impl<C> Task<C> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn call(&mut self, cx: &mut C, dt: f64) -> Flow {
        (self.run)(cx, dt)
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

pub type Easing = fn(f64) -> f64;

pub fn linear(t: f64) -> f64 {
    t
}

pub fn ease_in_out(t: f64) -> f64 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

pub fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

#[derive(Debug, Clone, Copy)]
pub struct TweenConfig {
    pub range: (f64, f64),
    /// Seconds.
    pub duration: f64,
    pub easing: Easing,
}

impl TweenConfig {
    pub fn new(start: f64, end: f64, duration: f64) -> Self {
        Self {
            range: (start, end),
            duration,
            easing: linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenStep {
    Running(f64),
    Finished(f64),
}

/// Time-boxed scalar interpolation.
#[derive(Debug, Clone)]
pub struct Tween {
    config: TweenConfig,
    elapsed: f64,
    finished: bool,
}

impl Tween {
    pub fn new(config: TweenConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
            finished: false,
        }
    }

    /// Advance by `dt` seconds.
    ///
    /// The value reported on a frame is sampled at the time accumulated
    /// before that frame's delta. Once the accumulated time reaches the
    /// duration the end value is reported exactly once; further calls keep
    /// returning `Finished(end)`.
    pub fn step(&mut self, dt: f64) -> TweenStep {
        let (start, end) = self.config.range;

        if self.finished || self.elapsed >= self.config.duration {
            self.finished = true;
            return TweenStep::Finished(end);
        }

        let t = (self.config.easing)(self.elapsed / self.config.duration);
        self.elapsed += dt.max(0.0);
        TweenStep::Running(lerp(start, end, t))
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Completion signal for a tween, polled by sequencing code.
#[derive(Debug, Clone, Default)]
pub struct Completion(Rc<Cell<bool>>);

impl Completion {
    pub fn is_resolved(&self) -> bool {
        self.0.get()
    }

    fn resolve(&self) {
        self.0.set(true);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn flow_conversions() {
        assert_eq!(Flow::from(()), Flow::Continue);
        assert_eq!(Flow::from(true), Flow::Continue);
        assert_eq!(Flow::from(false), Flow::Stop);
    }

    #[test]
    fn frame_clock_reports_wall_clock_delta() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();
        assert_eq!(clock.tick(t0), 0.0);
        let dt = clock.tick(t0 + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-9);
        // A timestamp from the past never yields a negative delta.
        assert_eq!(clock.tick(t0), 0.0);
    }

    #[test]
    fn animate_stops_only_on_false() {
        let mut sched: Scheduler<Vec<f64>> = Scheduler::new();
        let mut frames = 0;
        sched.animate(move |log: &mut Vec<f64>, dt| {
            log.push(dt);
            frames += 1;
            frames < 3
        });
        sched.animate(|log: &mut Vec<f64>, _dt| {
            log.push(-1.0);
        });

        let mut log = Vec::new();
        for _ in 0..5 {
            sched.run(&mut log, 0.016);
        }

        // The bool task ran three times, the unit task every frame.
        assert_eq!(log.iter().filter(|v| **v > 0.0).count(), 3);
        assert_eq!(log.iter().filter(|v| **v < 0.0).count(), 5);
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn cancel_removes_pending_task() {
        let mut sched: Scheduler<u32> = Scheduler::new();
        let id = sched.animate(|count: &mut u32, _| {
            *count += 1;
        });
        let mut count = 0;
        sched.run(&mut count, 0.016);
        assert!(sched.cancel(id));
        sched.run(&mut count, 0.016);
        assert_eq!(count, 1);
        assert!(!sched.cancel(id));
    }

    #[test]
    fn cancel_while_taken_out_is_honoured() {
        let mut sched: Scheduler<u32> = Scheduler::new();
        let id = sched.animate(|count: &mut u32, _| {
            *count += 1;
        });

        let tasks = sched.take_tasks();
        assert!(!sched.cancel(id));
        assert!(sched.is_cancelled(id));
        sched.restore_tasks(tasks);
        assert!(sched.is_empty());
    }

    #[test]
    fn tween_lands_exactly_on_end() {
        let mut tween = Tween::new(TweenConfig::new(1.0, 0.0, 0.5));
        let mut last = None;
        let mut finished_count = 0;
        // Jittery frame times.
        for dt in [0.016, 0.033, 0.007, 0.1, 0.2, 0.3, 0.016, 0.016] {
            match tween.step(dt) {
                TweenStep::Running(v) => {
                    assert!((0.0..=1.0).contains(&v));
                    last = Some(v);
                }
                TweenStep::Finished(v) => {
                    finished_count += 1;
                    last = Some(v);
                    break;
                }
            }
        }
        assert_eq!(finished_count, 1);
        assert_eq!(last, Some(0.0));
        assert!(tween.is_finished());
    }

    #[test]
    fn scheduled_tween_resolves_completion() {
        let mut sched: Scheduler<Vec<f64>> = Scheduler::new();
        let (_, done) = sched.tween(
            TweenConfig::new(0.0, 10.0, 0.1).with_easing(ease_in_out),
            |values: &mut Vec<f64>, v| values.push(v),
        );

        let mut values = Vec::new();
        let mut frames = 0;
        while !done.is_resolved() {
            sched.run(&mut values, 0.03);
            frames += 1;
            assert!(frames < 100);
        }

        assert_eq!(values.first().copied(), Some(0.0));
        assert_eq!(values.last().copied(), Some(10.0));
        assert_eq!(values.iter().filter(|v| **v == 10.0).count(), 1);
        assert!(sched.is_empty());
    }

    #[test]
    fn easing_endpoints() {
        for easing in [linear as Easing, ease_in_out, ease_out_cubic] {
            assert!(easing(0.0).abs() < 1e-12);
            assert!((easing(1.0) - 1.0).abs() < 1e-12);
        }
    }
}
