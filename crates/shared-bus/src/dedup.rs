//! # In-Flight Set
//!
//! Time-bounded set of job ids that are queued or running.
//!
//! - An id is admitted once; re-admitting it while present is refused.
//! - `release` removes an id when its job finishes, so the same id may be
//!   submitted again later (the ledger still deduplicates the credit).
//! - Entries expire after the validity window, so a worker that dies
//!   without releasing cannot block an id forever.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Time-bounded set of in-flight job ids.
pub struct InFlightSet {
    /// Map of id -> instant it was admitted.
    entries: HashMap<String, Instant>,

    /// How long an unreleased id stays blocked.
    validity_window: Duration,

    /// Last garbage collection.
    last_gc: Instant,

    /// Garbage collection interval.
    gc_interval: Duration,
}

impl InFlightSet {
    /// Default validity window: 10 minutes.
    pub const DEFAULT_VALIDITY_WINDOW: Duration = Duration::from_secs(600);

    /// Default garbage collection interval.
    pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(10);

    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_VALIDITY_WINDOW, Self::DEFAULT_GC_INTERVAL)
    }

    #[must_use]
    pub fn with_config(validity_window: Duration, gc_interval: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            validity_window,
            last_gc: Instant::now(),
            gc_interval,
        }
    }

    /// Admit `id` unless it is already in flight. Returns `true` if admitted.
    pub fn admit(&mut self, id: &str) -> bool {
        let now = Instant::now();

        if now.duration_since(self.last_gc) > self.gc_interval {
            self.garbage_collect(now);
            self.last_gc = now;
        }

        match self.entries.get(id) {
            Some(admitted) if now.duration_since(*admitted) < self.validity_window => false,
            _ => {
                self.entries.insert(id.to_string(), now);
                true
            }
        }
    }

    /// Forget `id`.
    pub fn release(&mut self, id: &str) {
        self.entries.remove(id);
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn garbage_collect(&mut self, now: Instant) {
        let window = self.validity_window;
        self.entries
            .retain(|_, admitted| now.duration_since(*admitted) < window);
    }
}

impl Default for InFlightSet {
    fn default() -> Self {
        Self::new()
    }
}
