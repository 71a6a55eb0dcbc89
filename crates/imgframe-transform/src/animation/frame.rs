//! Frame schedulers.
//!
//! The animator advances once per rendering frame. Where frames come from is
//! up to the host: a display-linked callback, a fixed interval timer, or a
//! test driving time by hand. All of them implement [`FrameScheduler`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use futures::channel::oneshot;

/// Callback invoked with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Source of frame boundaries.
///
/// Timestamps are milliseconds on a monotonic clock shared by [`now`] and
/// the values passed to frame callbacks.
///
/// [`now`]: FrameScheduler::now
pub trait FrameScheduler {
    /// Current time in milliseconds.
    fn now(&self) -> f64;

    /// Invoke `callback` once, at the next frame, with that frame's
    /// timestamp. Each request yields at most one invocation.
    fn request_frame(&self, callback: FrameCallback);
}

impl<S: FrameScheduler + ?Sized> FrameScheduler for Rc<S> {
    fn now(&self) -> f64 {
        (**self).now()
    }

    fn request_frame(&self, callback: FrameCallback) {
        (**self).request_frame(callback)
    }
}

/// Wait for the next frame.
///
/// Resolves to `None` if the scheduler dropped the request without running it.
pub(crate) async fn next_frame<S: FrameScheduler + ?Sized>(scheduler: &S) -> Option<f64> {
    let (tx, rx) = oneshot::channel();
    scheduler.request_frame(Box::new(move |timestamp| {
        let _ = tx.send(timestamp);
    }));
    rx.await.ok()
}

#[derive(Default)]
struct ManualClockInner {
    now: f64,
    pending: Vec<FrameCallback>,
}

/// A clock advanced by hand.
///
/// Frame requests queue up until [`tick`](Self::tick) delivers them. Requests
/// made from inside a callback wait for the following tick, like a display
/// refresh loop.
#[derive(Clone, Default)]
pub struct ManualFrameClock {
    inner: Rc<RefCell<ManualClockInner>>,
}

impl std::fmt::Debug for ManualFrameClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ManualFrameClock")
            .field("now", &inner.now)
            .field("pending", &inner.pending.len())
            .finish()
    }
}

impl ManualFrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: f64) -> Self {
        let clock = Self::new();
        clock.set_now(now);
        clock
    }

    /// Move the clock without delivering any frame.
    pub fn set_now(&self, now: f64) {
        self.inner.borrow_mut().now = now;
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Set the clock to `timestamp` and deliver every pending frame request.
    ///
    /// Returns how many callbacks ran.
    pub fn tick(&self, timestamp: f64) -> usize {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            inner.now = timestamp;
            std::mem::take(&mut inner.pending)
        };
        let count = callbacks.len();
        for callback in callbacks {
            callback(timestamp);
        }
        count
    }

    /// Discard pending requests without running them, as a torn-down display
    /// loop would.
    pub fn drop_pending(&self) -> usize {
        let dropped = std::mem::take(&mut self.inner.borrow_mut().pending);
        dropped.len()
    }
}

impl FrameScheduler for ManualFrameClock {
    fn now(&self) -> f64 {
        self.inner.borrow().now
    }

    fn request_frame(&self, callback: FrameCallback) {
        self.inner.borrow_mut().pending.push(callback);
    }
}

/// Default frame interval, one 60 Hz refresh.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Wall-clock scheduler for headless use.
///
/// `request_frame` blocks the calling thread until the next multiple of the
/// interval (measured from construction), then runs the callback inline.
#[derive(Debug, Clone, Copy)]
pub struct IntervalFrameClock {
    origin: Instant,
    interval: Duration,
}

impl Default for IntervalFrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl IntervalFrameClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval: interval.max(Duration::from_micros(100)),
        }
    }

    pub fn from_millis(interval_ms: f64) -> Self {
        if interval_ms.is_finite() && interval_ms > 0.0 {
            Self::new(Duration::from_secs_f64(interval_ms / 1000.0))
        } else {
            Self::default()
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl FrameScheduler for IntervalFrameClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn request_frame(&self, callback: FrameCallback) {
        let interval_ms = self.interval.as_secs_f64() * 1000.0;
        let elapsed = self.now();
        let next = ((elapsed / interval_ms).floor() + 1.0) * interval_ms;
        std::thread::sleep(Duration::from_secs_f64((next - elapsed).max(0.0) / 1000.0));
        callback(self.now());
    }
}
