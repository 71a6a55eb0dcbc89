//! Frame-driven matrix animation.
//!
//! [`Animator::animate`] tweens the store's matrix from one value to another
//! over a wall-clock duration, committing one interpolated matrix per frame:
//!
//! ```text
//! t = clamp((now - start) / duration, 0, 1)
//! k = easing(t)
//! m = from + (to - from) * k        (per coefficient)
//! ```
//!
//! The run ends on the first frame where `t` reaches 1; that frame commits
//! `to` itself rather than an interpolated value, so the store always lands
//! exactly on the target.
//!
//! Every call takes a new generation from the store. A run whose generation
//! has been replaced stops at its next frame without writing, so the most
//! recent `animate` call always owns the matrix.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};

use super::easing::EasingFunction;
use super::events::{AnimationEvent, EventQueue};
use super::frame::{FrameScheduler, next_frame};
use super::interpolate::Interpolate;
use super::types::{AnimationId, AnimationOutcome};
use crate::matrix::AffineMatrix;
use crate::store::TransformStore;

/// Duration used by [`Animator::animate`] unless configured otherwise.
pub const DEFAULT_DURATION_MS: f64 = 350.0;

/// Drives animations of a [`TransformStore`] on a [`FrameScheduler`].
///
/// Cloning is cheap; clones share the store, scheduler and event queue.
#[derive(Clone)]
pub struct Animator<S> {
    store: TransformStore,
    scheduler: S,
    easing: EasingFunction,
    default_duration_ms: f64,
    events: Rc<RefCell<EventQueue>>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for Animator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("scheduler", &self.scheduler)
            .field("easing", &self.easing)
            .field("default_duration_ms", &self.default_duration_ms)
            .finish_non_exhaustive()
    }
}

/// Timing of a single run.
#[derive(Debug, Clone, Copy)]
struct RunTiming {
    start: f64,
    duration_ms: f64,
}

impl RunTiming {
    /// Time fraction for a frame at `now`, never below `floor`.
    ///
    /// Non-positive or non-finite durations, and unusable timestamps, finish
    /// immediately.
    fn progress(&self, now: f64, floor: f64) -> f64 {
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            return 1.0;
        }
        let t = (now - self.start) / self.duration_ms;
        if t.is_nan() {
            return 1.0;
        }
        t.clamp(0.0, 1.0).max(floor)
    }
}

impl<S: FrameScheduler + Clone + 'static> Animator<S> {
    pub fn new(store: TransformStore, scheduler: S) -> Self {
        Self {
            store,
            scheduler,
            easing: EasingFunction::default(),
            default_duration_ms: DEFAULT_DURATION_MS,
            events: Rc::new(RefCell::new(EventQueue::new())),
        }
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_default_duration(mut self, duration_ms: f64) -> Self {
        self.default_duration_ms = duration_ms;
        self
    }

    pub fn store(&self) -> &TransformStore {
        &self.store
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn easing(&self) -> EasingFunction {
        self.easing
    }

    pub fn default_duration_ms(&self) -> f64 {
        self.default_duration_ms
    }

    /// Animate from `from` to `to` over the default duration.
    pub fn animate(
        &self,
        from: AffineMatrix,
        to: AffineMatrix,
    ) -> LocalBoxFuture<'static, AnimationOutcome> {
        self.animate_with_duration(from, to, self.default_duration_ms)
    }

    /// Animate from the current matrix to `to` over the default duration.
    pub fn animate_to(&self, to: AffineMatrix) -> LocalBoxFuture<'static, AnimationOutcome> {
        self.animate(self.store.matrix(), to)
    }

    /// Animate from `from` to `to` over `duration_ms` milliseconds.
    ///
    /// `is_animating` is raised and the start time sampled before this
    /// returns; the first frame is requested when the future is first polled.
    /// The future always resolves, with [`AnimationOutcome::Superseded`] if
    /// another call took over first.
    pub fn animate_with_duration(
        &self,
        from: AffineMatrix,
        to: AffineMatrix,
        duration_ms: f64,
    ) -> LocalBoxFuture<'static, AnimationOutcome> {
        let id = self.store.begin_animation();
        let timing = RunTiming {
            start: self.scheduler.now(),
            duration_ms,
        };
        log::debug!(
            "animation {id} started: {duration_ms}ms, easing {}",
            self.easing
        );
        self.events.borrow_mut().push(AnimationEvent::Started {
            animation_id: id,
            from,
            to,
            duration_ms,
        });

        let run = Run {
            id,
            from,
            to,
            timing,
            easing: self.easing,
            store: self.store.clone(),
            events: self.events.clone(),
        };
        let scheduler = self.scheduler.clone();
        async move { run.drive(&scheduler).await }.boxed_local()
    }

    /// Remove and return every recorded lifecycle event.
    pub fn drain_events(&self) -> Vec<AnimationEvent> {
        self.events.borrow_mut().drain()
    }
}

/// State of one in-flight animation.
struct Run {
    id: AnimationId,
    from: AffineMatrix,
    to: AffineMatrix,
    timing: RunTiming,
    easing: EasingFunction,
    store: TransformStore,
    events: Rc<RefCell<EventQueue>>,
}

impl Run {
    async fn drive<S: FrameScheduler + ?Sized>(self, scheduler: &S) -> AnimationOutcome {
        let mut last_t = 0.0;
        loop {
            let Some(now) = next_frame(scheduler).await else {
                log::warn!(
                    "frame scheduler dropped a request; animation {} jumps to its target",
                    self.id
                );
                return self.complete(last_t);
            };

            let t = self.timing.progress(now, last_t);
            if t >= 1.0 {
                return self.complete(t);
            }

            let k = self.easing.evaluate(t);
            if !self.store.commit_frame(self.id, self.from.interpolate(&self.to, k)) {
                return self.superseded();
            }
            log::trace!("animation {} frame t={t:.4} k={k:.4}", self.id);
            self.push(AnimationEvent::Frame {
                animation_id: self.id,
                t,
                k,
            });
            last_t = t;
        }
    }

    /// Commit the exact target and lower the flag.
    fn complete(&self, t: f64) -> AnimationOutcome {
        if !self.store.commit_frame(self.id, self.to) {
            return self.superseded();
        }
        self.push(AnimationEvent::Frame {
            animation_id: self.id,
            t: t.max(1.0),
            k: 1.0,
        });
        self.store.finish_animation(self.id);
        self.push(AnimationEvent::Completed {
            animation_id: self.id,
        });
        log::debug!("animation {} completed", self.id);
        AnimationOutcome::Completed
    }

    fn superseded(&self) -> AnimationOutcome {
        self.push(AnimationEvent::Superseded {
            animation_id: self.id,
        });
        log::debug!("animation {} superseded", self.id);
        AnimationOutcome::Superseded
    }

    fn push(&self, event: AnimationEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl Drop for Run {
    /// A run dropped before finishing gives up the flag, unless a newer
    /// animation already holds it.
    fn drop(&mut self) {
        if self.store.finish_animation(self.id) {
            log::debug!("animation {} cancelled", self.id);
        }
    }
}
