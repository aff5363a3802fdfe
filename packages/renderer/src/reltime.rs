//! Relative-time labels with adaptive self-rescheduling.
//!
//! `format_relative` is the pure bucket function; `RelativeTimeTicker` is
//! its stateful wrapper, recomputing the label on a timer that tightens as
//! the timestamp gets closer to now.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::scheduler::{Scheduler, TimerToken};

/// Label used when the input timestamp cannot be parsed.
pub const INVALID_TIME_LABEL: &str = "invalid date";

const YEAR_SECS: f64 = 31_536_000.0;
const MONTH_SECS: f64 = 2_592_000.0;
const WEEK_SECS: f64 = 604_800.0;
const DAY_SECS: f64 = 86_400.0;
const HOUR_SECS: f64 = 3_600.0;
const MINUTE_SECS: f64 = 60.0;

fn unit(n: i64, singular: &str) -> String {
    if n == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}s", n, singular)
    }
}

/// Bucketed relative label for `time` as seen from `now`.
///
/// Thresholds are evaluated in order, first match wins; the minute boundary
/// at 60 s is inclusive. Years through hours round to nearest; minutes and
/// seconds truncate toward zero. The band `-3 <= ago < 10` is "just now";
/// anything earlier mirrors the past buckets with "in N ..." phrasing.
pub fn format_relative(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let ago = (now - time).num_milliseconds() as f64 / 1000.0;

    if ago >= YEAR_SECS {
        format!("{} ago", unit((ago / YEAR_SECS).round() as i64, "year"))
    } else if ago >= MONTH_SECS {
        format!("{} ago", unit((ago / MONTH_SECS).round() as i64, "month"))
    } else if ago >= WEEK_SECS {
        format!("{} ago", unit((ago / WEEK_SECS).round() as i64, "week"))
    } else if ago >= DAY_SECS {
        format!("{} ago", unit((ago / DAY_SECS).round() as i64, "day"))
    } else if ago >= HOUR_SECS {
        format!("{} ago", unit((ago / HOUR_SECS).round() as i64, "hour"))
    } else if ago >= MINUTE_SECS {
        format!("{} ago", unit((ago / MINUTE_SECS) as i64, "minute"))
    } else if ago >= 10.0 {
        format!("{} ago", unit(ago as i64, "second"))
    } else if ago >= -3.0 {
        "just now".to_string()
    } else {
        let ahead = -ago;
        if ahead >= YEAR_SECS {
            format!("in {}", unit((ahead / YEAR_SECS).round() as i64, "year"))
        } else if ahead >= MONTH_SECS {
            format!("in {}", unit((ahead / MONTH_SECS).round() as i64, "month"))
        } else if ahead >= WEEK_SECS {
            format!("in {}", unit((ahead / WEEK_SECS).round() as i64, "week"))
        } else if ahead >= DAY_SECS {
            format!("in {}", unit((ahead / DAY_SECS).round() as i64, "day"))
        } else if ahead >= HOUR_SECS {
            format!("in {}", unit((ahead / HOUR_SECS).round() as i64, "hour"))
        } else if ahead >= MINUTE_SECS {
            format!("in {}", unit((ahead / MINUTE_SECS) as i64, "minute"))
        } else {
            format!("in {}", unit(ahead as i64, "second"))
        }
    }
}

/// Parse a timestamp from directive input.
///
/// Pure-digit strings are epoch seconds; signed integers are epoch
/// milliseconds; everything else is tried as RFC 3339.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.chars().all(|c| c.is_ascii_digit()) {
        let secs: i64 = input.parse().ok()?;
        return Utc.timestamp_millis_opt(secs.checked_mul(1000)?).single();
    }
    if let Ok(millis) = input.parse::<i64>() {
        return Utc.timestamp_millis_opt(millis).single();
    }
    DateTime::parse_from_rfc3339(input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Display mode of the ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeDisplayMode {
    Relative,
    /// Absolute-only: no relative label, no rescheduling.
    Absolute,
    /// Absolute with the relative label in parentheses.
    Both,
}

struct TickerInner {
    time: Option<DateTime<Utc>>,
    mode: TimeDisplayMode,
    /// Deterministic reference "now"; set in tests and static renders.
    /// Disables rescheduling entirely.
    fixed_now: Option<DateTime<Utc>>,
    scheduler: Arc<dyn Scheduler>,
    label: watch::Sender<String>,
    stopped: AtomicBool,
    token: Mutex<Option<TimerToken>>,
}

impl TickerInner {
    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    fn compute_label(&self, time: DateTime<Utc>, now: DateTime<Utc>) -> String {
        match self.mode {
            TimeDisplayMode::Relative => format_relative(time, now),
            TimeDisplayMode::Absolute => time.to_rfc3339(),
            TimeDisplayMode::Both => {
                format!("{} ({})", time.to_rfc3339(), format_relative(time, now))
            }
        }
    }

    fn tick(self: Arc<Self>) {
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }

        let time = match self.time {
            Some(t) => t,
            None => {
                let _ = self.label.send(INVALID_TIME_LABEL.to_string());
                return;
            }
        };

        let now = self.now();
        let _ = self.label.send(self.compute_label(time, now));

        if self.fixed_now.is_some() || self.mode == TimeDisplayMode::Absolute {
            return;
        }

        let ago_abs = ((now - time).num_milliseconds() as f64 / 1000.0).abs();
        let delay = if ago_abs < 60.0 {
            Duration::from_secs(10)
        } else if ago_abs < 3600.0 {
            Duration::from_secs(60)
        } else {
            Duration::from_secs(180)
        };

        let next = Arc::clone(&self);
        let token = self.scheduler.schedule(delay, Box::new(move || next.tick()));
        *self.token.lock().expect("ticker lock poisoned") = Some(token);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(token) = self.token.lock().expect("ticker lock poisoned").take() {
            self.scheduler.cancel(token);
        }
    }
}

/// Self-rescheduling relative-time label.
///
/// The current label is published through a `watch` channel; the first value
/// is available immediately after construction. Dropping the ticker cancels
/// its pending timer; no callback runs after teardown.
pub struct RelativeTimeTicker {
    inner: Arc<TickerInner>,
    rx: watch::Receiver<String>,
}

impl RelativeTimeTicker {
    pub fn new(
        time: Option<DateTime<Utc>>,
        mode: TimeDisplayMode,
        fixed_now: Option<DateTime<Utc>>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let (tx, rx) = watch::channel(String::new());
        let inner = Arc::new(TickerInner {
            time,
            mode,
            fixed_now,
            scheduler,
            label: tx,
            stopped: AtomicBool::new(false),
            token: Mutex::new(None),
        });
        debug!(?mode, fixed = fixed_now.is_some(), "starting time ticker");
        Arc::clone(&inner).tick();
        Self { inner, rx }
    }

    /// Parse `input` and start a ticker; unparseable input yields the fixed
    /// placeholder label and never schedules.
    pub fn from_input(
        input: &str,
        mode: TimeDisplayMode,
        fixed_now: Option<DateTime<Utc>>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self::new(parse_timestamp(input), mode, fixed_now, scheduler)
    }

    pub fn label(&self) -> String {
        self.rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.rx.clone()
    }

    pub fn stop(&self) {
        self.inner.stop();
    }
}

impl Drop for RelativeTimeTicker {
    fn drop(&mut self) {
        self.inner.stop();
    }
}
