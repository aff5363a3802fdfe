//! Procedural sparkle particle effect.
//!
//! Bound to one directive's content region. While running it spawns one
//! particle at a time: random padded position, size, lifetime, and a color
//! from a fixed palette. Spawn cadence (500–1000 ms gaps) is independent of
//! particle lifetimes, so several particles can overlap. Teardown sets a
//! stop flag before cancelling timers, and every callback checks the flag,
//! so nothing is added or leaked after disposal.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::scheduler::{Scheduler, TimerToken};

pub const SPARKLE_COLORS: [&str; 3] = ["#FF1493", "#00FFFF", "#FFE202"];

/// Padding around the tracked box within which particles may spawn.
const SPAWN_PAD: f64 = 10.0;

/// Tracked bounding box of the decorated content.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub lifetime_ms: u64,
    pub color: &'static str,
}

struct SparkleInner {
    scheduler: Arc<dyn Scheduler>,
    stopped: AtomicBool,
    bounds: Mutex<Rect>,
    particles: Mutex<Vec<Particle>>,
    tokens: Mutex<HashSet<TimerToken>>,
    next_particle_id: AtomicU64,
}

impl SparkleInner {
    /// Schedule `f` and keep its token accounted for until it fires.
    fn schedule_tracked(
        this: &Arc<Self>,
        delay: Duration,
        f: impl FnOnce(&Arc<SparkleInner>) + Send + 'static,
    ) {
        let slot = Arc::new(Mutex::new(None::<TimerToken>));
        let inner = Arc::clone(this);
        let cb_slot = Arc::clone(&slot);
        let token = this.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(token) = cb_slot.lock().expect("sparkle lock poisoned").take() {
                    inner
                        .tokens
                        .lock()
                        .expect("sparkle lock poisoned")
                        .remove(&token);
                }
                if inner.stopped.load(Ordering::SeqCst) {
                    return;
                }
                f(&inner);
            }),
        );
        *slot.lock().expect("sparkle lock poisoned") = Some(token);
        this.tokens
            .lock()
            .expect("sparkle lock poisoned")
            .insert(token);
    }

    fn spawn_particle(this: &Arc<Self>) {
        let bounds = *this.bounds.lock().expect("sparkle lock poisoned");
        let mut rng = rand::thread_rng();

        let particle = Particle {
            id: this.next_particle_id.fetch_add(1, Ordering::SeqCst),
            x: rng.gen::<f64>() * (bounds.width + SPAWN_PAD * 2.0) - SPAWN_PAD,
            y: rng.gen::<f64>() * (bounds.height + SPAWN_PAD * 2.0) - SPAWN_PAD,
            size: 8.0 + rng.gen::<f64>() * 16.0,
            lifetime_ms: rng.gen_range(1000..=2000),
            color: SPARKLE_COLORS[rng.gen_range(0..SPARKLE_COLORS.len())],
        };
        let id = particle.id;
        let lifetime = Duration::from_millis(particle.lifetime_ms);

        this.particles
            .lock()
            .expect("sparkle lock poisoned")
            .push(particle);

        // Particle removes itself after its own lifetime.
        Self::schedule_tracked(this, lifetime, move |inner| {
            inner
                .particles
                .lock()
                .expect("sparkle lock poisoned")
                .retain(|p| p.id != id);
        });

        // Next spawn is on its own independent cadence.
        Self::schedule_next_spawn(this);
    }

    fn schedule_next_spawn(this: &Arc<Self>) {
        let gap = Duration::from_millis(rand::thread_rng().gen_range(500..=1000));
        Self::schedule_tracked(this, gap, |inner| Self::spawn_particle(inner));
    }

    fn stop(&self) {
        // Flag first: a timer firing between the flag and its cancellation
        // must see the animator as stopped.
        self.stopped.store(true, Ordering::SeqCst);
        let tokens: Vec<TimerToken> = self
            .tokens
            .lock()
            .expect("sparkle lock poisoned")
            .drain()
            .collect();
        for token in tokens {
            self.scheduler.cancel(token);
        }
        self.particles
            .lock()
            .expect("sparkle lock poisoned")
            .clear();
        debug!("sparkle animator stopped");
    }
}

pub struct SparkleAnimator {
    inner: Arc<SparkleInner>,
}

impl SparkleAnimator {
    /// Create and start spawning against the given initial bounds.
    pub fn start(bounds: Rect, scheduler: Arc<dyn Scheduler>) -> Self {
        let inner = Arc::new(SparkleInner {
            scheduler,
            stopped: AtomicBool::new(false),
            bounds: Mutex::new(bounds),
            particles: Mutex::new(Vec::new()),
            tokens: Mutex::new(HashSet::new()),
            next_particle_id: AtomicU64::new(0),
        });
        SparkleInner::schedule_next_spawn(&inner);
        Self { inner }
    }

    /// Live particles, newest last.
    pub fn particles(&self) -> Vec<Particle> {
        self.inner
            .particles
            .lock()
            .expect("sparkle lock poisoned")
            .clone()
    }

    /// Update the tracked bounding box. Applies to subsequent spawns only.
    pub fn set_bounds(&self, bounds: Rect) {
        *self.inner.bounds.lock().expect("sparkle lock poisoned") = bounds;
    }

    pub fn stop(&self) {
        self.inner.stop();
    }
}

impl Drop for SparkleAnimator {
    fn drop(&mut self) {
        self.inner.stop();
    }
}
