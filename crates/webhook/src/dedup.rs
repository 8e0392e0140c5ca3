//! Bounded, time-windowed deduplication of provider event ids.
//!
//! Consulted before the fulfillment state machine runs. This is a fast-path
//! guard only — the state machine stays idempotent on its own (terminal
//! payment status), so losing this set on restart is safe.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// First-seen registry for event ids with a TTL window and a capacity bound.
///
/// Oldest entries are evicted first, both on expiry and on overflow.
#[derive(Debug)]
pub struct SeenEvents {
    inner: Mutex<Inner>,
    window: Duration,
    capacity: usize,
}

#[derive(Debug, Default)]
struct Inner {
    seen: HashMap<String, Instant>,
    order: VecDeque<(String, Instant)>,
}

impl SeenEvents {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            window,
            capacity: capacity.max(1),
        }
    }

    /// Record `event_id` if unseen within the window.
    ///
    /// Returns `true` if this is the first sighting (caller should proceed),
    /// `false` for a duplicate (caller should no-op).
    pub fn first_sighting(&self, event_id: &str) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        // Expire entries older than the window.
        while let Some((id, at)) = inner.order.front() {
            if now.duration_since(*at) <= self.window {
                break;
            }
            let id = id.clone();
            inner.order.pop_front();
            inner.seen.remove(&id);
        }

        if inner.seen.contains_key(event_id) {
            return false;
        }

        // Bounded: drop the oldest entry on overflow.
        if inner.seen.len() >= self.capacity {
            if let Some((oldest, _)) = inner.order.pop_front() {
                inner.seen.remove(&oldest);
            }
        }

        inner.seen.insert(event_id.to_string(), now);
        inner.order.push_back((event_id.to_string(), now));
        true
    }

    /// Remove `event_id` so a later delivery counts as a first sighting.
    ///
    /// Used when downstream processing failed transiently: the provider
    /// will retry with the same id, and that retry must not be swallowed
    /// as a duplicate.
    pub fn forget(&self, event_id: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.seen.remove(event_id).is_some() {
            inner.order.retain(|(id, _)| id != event_id);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SeenEvents {
    /// 24h window, 10k entries — generous for provider retry schedules.
    fn default() -> Self {
        Self::new(Duration::from_secs(24 * 60 * 60), 10_000)
    }
}
