//! Allocation tracking - every object brought into existence is reported here
//!
//! Design: The allocator hands each finished object to an `AllocationTracker`
//! before publishing it. Registration is infallible by contract: `record`
//! returns the handle and has no error channel.
//!
//! `CountingTracker` is the stock implementation: lock-free counters, with
//! optional per-class counts in a concurrent map.

use crate::config::AllocatorConfig;
use crate::logging::debug;
use crate::objects::{ClassId, ObjectHandle};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;


/// Process-wide service notified of every successful allocation
pub trait AllocationTracker: Send + Sync {
    /// Register `object` and hand it back (pass-through)
    fn record(&self, object: ObjectHandle) -> ObjectHandle;
}

/// Any thread-safe closure observing handles is a tracker
impl<F> AllocationTracker for F
where
    F: Fn(&ObjectHandle) + Send + Sync,
{
    #[inline]
    fn record(&self, object: ObjectHandle) -> ObjectHandle {
        self(&object);
        object
    }
}

/// Global tracker shared by allocators that are not given their own
static GLOBAL_TRACKER: Lazy<Arc<CountingTracker>> = Lazy::new(|| Arc::new(CountingTracker::new()));

pub fn global() -> Arc<CountingTracker> {
    Arc::clone(&GLOBAL_TRACKER)
}

/// Counting tracker (lock-free counters + concurrent per-class map)
#[derive(Debug, Default)]
pub struct CountingTracker {
    total: AtomicUsize,
    arrays: AtomicUsize,
    foreign: AtomicUsize,
    per_class: Option<DashMap<ClassId, usize>>,
}

impl CountingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker that also counts per class
    pub fn with_per_class() -> Self {
        Self {
            per_class: Some(DashMap::with_capacity(64)),
            ..Self::default()
        }
    }

    pub fn from_config(config: &AllocatorConfig) -> Self {
        if config.per_class_accounting {
            Self::with_per_class()
        } else {
            Self::new()
        }
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            total: self.total.load(Ordering::Relaxed),
            arrays: self.arrays.load(Ordering::Relaxed),
            foreign: self.foreign.load(Ordering::Relaxed),
        }
    }

    /// Objects recorded for `class` (0 without per-class accounting)
    pub fn count_for(&self, class: ClassId) -> usize {
        self.per_class
            .as_ref()
            .and_then(|map| map.get(&class).map(|count| *count))
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.arrays.store(0, Ordering::Relaxed);
        self.foreign.store(0, Ordering::Relaxed);
        if let Some(map) = &self.per_class {
            map.clear();
        }
        debug!(target: "guest_heap::tracker", "allocation counters reset");
    }
}

impl AllocationTracker for CountingTracker {
    #[inline]
    fn record(&self, object: ObjectHandle) -> ObjectHandle {
        debug_assert!(!object.is_null(), "tracked a null handle");
        self.total.fetch_add(1, Ordering::Relaxed);
        if object.is_array() {
            self.arrays.fetch_add(1, Ordering::Relaxed);
        }
        if object.is_foreign() {
            self.foreign.fetch_add(1, Ordering::Relaxed);
        }
        if let (Some(map), Some(class)) = (&self.per_class, object.class()) {
            *map.entry(class.id()).or_insert(0) += 1;
        }
        object
    }
}

/// Tracker statistics for monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub total: usize,
    pub arrays: usize,
    pub foreign: usize,
}
