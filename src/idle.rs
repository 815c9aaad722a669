//! Cooperative idle callbacks
//!
//! A scheduler is ticked once per pump. Each registration accumulates the time
//! elapsed between ticks and fires once the accumulator reaches its period,
//! after which the accumulator starts again from zero. Slow pumps delay
//! callbacks; they never cause a burst of catch-up calls.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Something called periodically from the pump
pub trait IdleCallback {
    fn idle_callback(&mut self);
}

impl<F: FnMut()> IdleCallback for F {
    fn idle_callback(&mut self) {
        self()
    }
}

/// Shared callback; its address is its identity for registration purposes
pub type SharedIdleCallback = Rc<RefCell<dyn IdleCallback>>;

fn same_callback(a: &SharedIdleCallback, b: &SharedIdleCallback) -> bool {
    Rc::as_ptr(a).cast::<()>() == Rc::as_ptr(b).cast::<()>()
}

struct Registration {
    callback: SharedIdleCallback,
    period: Duration,
    elapsed: Duration,
}

#[derive(Default)]
pub struct IdleScheduler {
    registrations: Vec<Registration>,
    last_tick: Option<Instant>,
}

impl IdleScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` to run every `period_ms` milliseconds (0 = every pump).
    ///
    /// Returns false if the same callback is already registered.
    pub fn add(&mut self, callback: SharedIdleCallback, period_ms: u32) -> bool {
        if self
            .registrations
            .iter()
            .any(|r| same_callback(&r.callback, &callback))
        {
            tracing::debug!("idle callback already registered");
            return false;
        }

        self.registrations.push(Registration {
            callback,
            period: Duration::from_millis(u64::from(period_ms)),
            elapsed: Duration::ZERO,
        });
        true
    }

    /// Returns false if the callback was not registered.
    pub fn remove(&mut self, callback: &SharedIdleCallback) -> bool {
        let before = self.registrations.len();
        self.registrations
            .retain(|r| !same_callback(&r.callback, callback));
        let removed = self.registrations.len() != before;
        if !removed {
            tracing::debug!("idle callback not registered");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Make the next tick start a new time base
    pub fn reset_time_base(&mut self) {
        self.last_tick = None;
    }

    /// Tick with the current time. The first tick only sets the time base.
    /// Returns how many callbacks fired.
    pub fn tick(&mut self, now: Instant) -> usize {
        let delta = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);
        self.advance(delta)
    }

    /// Account `delta` of elapsed time and fire everything that became due.
    pub fn advance(&mut self, delta: Duration) -> usize {
        let due: Vec<SharedIdleCallback> = self
            .registrations
            .iter_mut()
            .filter_map(|r| {
                r.elapsed += delta;
                if r.elapsed >= r.period {
                    r.elapsed = Duration::ZERO;
                    Some(Rc::clone(&r.callback))
                } else {
                    None
                }
            })
            .collect();

        for callback in &due {
            match callback.try_borrow_mut() {
                Ok(mut callback) => callback.idle_callback(),
                Err(_) => tracing::warn!("idle callback re-entered, skipping"),
            }
        }
        due.len()
    }
}
