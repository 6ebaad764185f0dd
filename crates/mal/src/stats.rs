//! Allocator statistics
//!
//! Counters are only kept when [`AllocatorConfig::track_stats`] is set;
//! allocators hand them out through `stats()`.
//!
//! [`AllocatorConfig::track_stats`]: crate::config::AllocatorConfig::track_stats

use core::fmt;

/// Operation counters for one allocator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Successful allocations
    pub allocations: u64,
    /// Slots or frames given back (resets not included)
    pub deallocations: u64,
    /// Allocations refused for lack of room
    pub failed_allocations: u64,
    /// Calls to `reset`
    pub resets: u64,
    /// Highest `used()` value seen, in bytes
    pub peak_used: usize,
}

impl AllocatorStats {
    /// Allocations not yet matched by a deallocation or reset
    #[must_use]
    pub fn live_allocations(&self) -> u64 {
        self.allocations.saturating_sub(self.deallocations)
    }

    pub(crate) fn record_alloc(&mut self, used: usize) {
        self.allocations += 1;
        self.peak_used = self.peak_used.max(used);
    }

    pub(crate) fn record_dealloc(&mut self) {
        self.deallocations += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failed_allocations += 1;
    }

    pub(crate) fn record_reset(&mut self) {
        self.resets += 1;
    }
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocs: {}, deallocs: {}, failed: {}, resets: {}, peak: {} bytes",
            self.allocations,
            self.deallocations,
            self.failed_allocations,
            self.resets,
            self.peak_used
        )
    }
}

/// Optional counters; a no-op when tracking is off
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StatsSlot(Option<AllocatorStats>);

impl StatsSlot {
    pub(crate) fn new(enabled: bool) -> Self {
        Self(enabled.then(AllocatorStats::default))
    }

    pub(crate) fn get(&self) -> Option<AllocatorStats> {
        self.0
    }

    #[inline]
    pub(crate) fn update(&mut self, f: impl FnOnce(&mut AllocatorStats)) {
        if let Some(stats) = self.0.as_mut() {
            f(stats);
        }
    }
}
