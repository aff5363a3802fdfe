//! Cooperative timer scheduling.
//!
//! Stateful render components (time tickers, particle effects) never call
//! into a runtime directly; they go through this trait so tests can drive
//! timers by hand and teardown can account for every pending callback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Handle for one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

pub trait Scheduler: Send + Sync {
    /// Run `callback` once after `delay`. The returned token stays valid
    /// until the callback runs or [`Scheduler::cancel`] is called.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerToken;

    /// Cancel a pending callback. Cancelling an already-fired or unknown
    /// token is a no-op.
    fn cancel(&self, token: TimerToken);
}

/// Production scheduler: one spawned sleep per timer, aborted on cancel.
pub struct TokioScheduler {
    next_id: AtomicU64,
    handles: Mutex<HashMap<TimerToken, tokio::task::JoinHandle<()>>>,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            handles: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerToken {
        let token = TimerToken(self.next_id.fetch_add(1, Ordering::SeqCst));
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        let mut handles = self.handles.lock().expect("scheduler lock poisoned");
        handles.retain(|_, h| !h.is_finished());
        handles.insert(token, handle);
        token
    }

    fn cancel(&self, token: TimerToken) {
        if let Some(handle) = self
            .handles
            .lock()
            .expect("scheduler lock poisoned")
            .remove(&token)
        {
            handle.abort();
        }
    }
}

struct PendingTimer {
    token: TimerToken,
    delay: Duration,
    callback: Box<dyn FnOnce() + Send>,
    cancelled: bool,
}

/// Test scheduler: callbacks queue up and fire only when told to.
///
/// `honor_cancel` controls whether [`Scheduler::cancel`] removes the
/// callback. With `ignoring_cancel()` a cancelled timer can still be fired,
/// which lets tests prove that components guard their callbacks with a stop
/// flag rather than relying on cancellation alone.
pub struct ManualScheduler {
    next_id: AtomicU64,
    pending: Mutex<Vec<PendingTimer>>,
    cancels: AtomicU64,
    honor_cancel: bool,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            pending: Mutex::new(Vec::new()),
            cancels: AtomicU64::new(0),
            honor_cancel: true,
        }
    }

    pub fn ignoring_cancel() -> Self {
        Self {
            honor_cancel: false,
            ..Self::new()
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .expect("scheduler lock poisoned")
            .iter()
            .filter(|t| !t.cancelled)
            .count()
    }

    pub fn cancel_count(&self) -> u64 {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Delay the next live timer was scheduled with, if any.
    pub fn next_delay(&self) -> Option<Duration> {
        self.pending
            .lock()
            .expect("scheduler lock poisoned")
            .iter()
            .find(|t| !t.cancelled)
            .map(|t| t.delay)
    }

    /// Fire the oldest queued timer, cancelled ones included when cancels
    /// are ignored. Returns false when nothing is queued.
    pub fn fire_next(&self) -> bool {
        let timer = {
            let mut pending = self.pending.lock().expect("scheduler lock poisoned");
            if pending.is_empty() {
                return false;
            }
            pending.remove(0)
        };
        (timer.callback)();
        true
    }

    /// Fire everything currently queued, in scheduling order. Callbacks
    /// scheduled by fired callbacks are left queued.
    pub fn fire_all(&self) -> usize {
        let timers: Vec<PendingTimer> = {
            let mut pending = self.pending.lock().expect("scheduler lock poisoned");
            std::mem::take(&mut *pending)
        };
        let count = timers.len();
        for timer in timers {
            (timer.callback)();
        }
        count
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerToken {
        let token = TimerToken(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.pending
            .lock()
            .expect("scheduler lock poisoned")
            .push(PendingTimer {
                token,
                delay,
                callback,
                cancelled: false,
            });
        token
    }

    fn cancel(&self, token: TimerToken) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        let mut pending = self.pending.lock().expect("scheduler lock poisoned");
        if self.honor_cancel {
            pending.retain(|t| t.token != token);
        } else if let Some(timer) = pending.iter_mut().find(|t| t.token == token) {
            timer.cancelled = true;
        }
    }
}
