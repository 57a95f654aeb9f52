//! Per-address submission limiter with a rolling window.
//!
//! A slot is reserved atomically before the expensive work and released if
//! that work fails, so concurrent requests cannot overshoot the limit and
//! only successful submissions count.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Rolling window length.
pub(crate) const WINDOW: Duration = Duration::from_secs(60 * 60);

/// A reserved submission slot.
#[derive(Debug)]
#[must_use = "a permit must be kept or released"]
pub(crate) struct Permit {
    ip: IpAddr,
    at: Instant,
}

/// Keyed rolling-window limiter.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    max: usize,
    window: Duration,
    entries: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub(crate) fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve a slot for `ip`, or `None` if the limit is reached.
    pub(crate) fn try_acquire(&self, ip: IpAddr, now: Instant) -> Option<Permit> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        // Drop addresses with nothing left in the window
        entries.retain(|_, times| {
            prune(times, now, self.window);
            !times.is_empty()
        });

        let times = entries.entry(ip).or_default();
        if times.len() >= self.max {
            return None;
        }
        times.push_back(now);
        Some(Permit { ip, at: now })
    }

    /// Give back a slot reserved by [`try_acquire`](Self::try_acquire).
    pub(crate) fn release(&self, permit: Permit) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(times) = entries.get_mut(&permit.ip) {
            if let Some(pos) = times.iter().rposition(|t| *t == permit.at) {
                times.remove(pos);
            }
            if times.is_empty() {
                entries.remove(&permit.ip);
            }
        }
    }
}

fn prune(times: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while times
        .front()
        .is_some_and(|t| now.saturating_duration_since(*t) >= window)
    {
        times.pop_front();
    }
}
