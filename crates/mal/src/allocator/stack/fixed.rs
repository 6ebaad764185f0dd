//! Fixed-slot stack
//!
//! Slot `i` lives at `i * slot_size`; only the top slot can be released, so
//! no free-list bookkeeping is needed.

use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::debug;

use crate::allocator::Slot;
use crate::config::AllocatorConfig;
use crate::core::{MemoryUsage, Resettable};
use crate::error::{MemoryError, MemoryResult};
use crate::page::{PageSource, SystemPages};
use crate::region::Region;
use crate::stats::{AllocatorStats, StatsSlot};

const KIND: &str = "fixed stack";

/// Stack of equally sized slots
#[derive(Debug)]
pub struct FixedStack<S: PageSource = SystemPages> {
    region: Region<S>,
    slot_size: usize,
    slot_count: usize,
    taken: usize,
    config: AllocatorConfig,
    stats: StatsSlot,
}

impl FixedStack<SystemPages> {
    /// Stack of at least `capacity` bytes of OS pages, split into `slot_size` slots
    pub fn new(capacity: usize, slot_size: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, slot_size, AllocatorConfig::default())
    }

    /// Stack of OS pages with a custom configuration
    pub fn with_config(
        capacity: usize,
        slot_size: usize,
        config: AllocatorConfig,
    ) -> MemoryResult<Self> {
        Self::with_source(capacity, slot_size, SystemPages, config)
    }
}

impl<S: PageSource> FixedStack<S> {
    /// Stack backed by an arbitrary page source
    ///
    /// # Errors
    /// `InvalidConfig` if `slot_size` is zero, the capacity is zero, or the
    /// page-rounded capacity is not a multiple of `slot_size`.
    pub fn with_source(
        capacity: usize,
        slot_size: usize,
        source: S,
        config: AllocatorConfig,
    ) -> MemoryResult<Self> {
        if slot_size == 0 {
            return Err(MemoryError::invalid_config("slot size must be non-zero")
                .escalate(config.failure_mode));
        }
        let region =
            Region::acquire(capacity, source).map_err(|e| e.escalate(config.failure_mode))?;
        if region.len() % slot_size != 0 {
            return Err(MemoryError::invalid_config(format!(
                "region of {} bytes is not a multiple of slot size {slot_size}",
                region.len()
            ))
            .escalate(config.failure_mode));
        }

        #[cfg(feature = "logging")]
        debug!(capacity = region.len(), slot_size, "created fixed stack");

        Ok(Self {
            slot_count: region.len() / slot_size,
            region,
            slot_size,
            taken: 0,
            config,
            stats: StatsSlot::new(config.track_stats),
        })
    }

    /// Push a slot
    pub fn alloc(&mut self) -> MemoryResult<Slot> {
        if self.taken == self.slot_count {
            self.stats.update(AllocatorStats::record_failure);
            return Err(
                MemoryError::exhausted(KIND, self.slot_size, 0, self.capacity())
                    .escalate(self.config.failure_mode),
            );
        }

        let slot = Slot { index: self.taken };
        self.taken += 1;
        let used = self.used();
        self.stats.update(|s| s.record_alloc(used));
        Ok(slot)
    }

    /// Pop the top slot; does nothing on an empty stack
    ///
    /// Returns the slot that was released so the caller can drop its handle.
    pub fn free(&mut self) -> Option<Slot> {
        let index = self.taken.checked_sub(1)?;
        if let Some(pattern) = self.config.dealloc_pattern {
            let start = index * self.slot_size;
            let _ = self.region.fill(start..start + self.slot_size, pattern);
        }
        self.taken = index;
        self.stats.update(AllocatorStats::record_dealloc);
        Some(Slot { index })
    }

    /// Pop `slot`, which must be the top of the stack
    pub fn release(&mut self, slot: Slot) -> MemoryResult<()> {
        match self.top() {
            Some(top) if top == slot => {
                self.free();
                Ok(())
            }
            top => Err(MemoryError::precondition(
                KIND,
                format!("released slot {} but top is {top:?}", slot.index),
            )
            .escalate(self.config.failure_mode)),
        }
    }

    /// Most recently pushed live slot
    #[inline]
    pub fn top(&self) -> Option<Slot> {
        self.taken.checked_sub(1).map(|index| Slot { index })
    }

    /// Pop everything
    pub fn reset(&mut self) {
        if let Some(pattern) = self.config.dealloc_pattern {
            let _ = self.region.fill(0..self.used(), pattern);
        }
        self.taken = 0;
        self.stats.update(AllocatorStats::record_reset);

        #[cfg(feature = "logging")]
        debug!("fixed stack reset");
    }

    /// Release the region back to its page source
    pub fn destroy(self) -> MemoryResult<()> {
        let mode = self.config.failure_mode;
        self.region.release().map_err(|e| e.escalate(mode))?;

        #[cfg(feature = "logging")]
        debug!("destroyed fixed stack");

        Ok(())
    }

    fn live(&self, slot: Slot) -> MemoryResult<core::ops::Range<usize>> {
        if slot.index >= self.taken {
            return Err(MemoryError::precondition(
                KIND,
                format!("slot {} is not live ({} taken)", slot.index, self.taken),
            ));
        }
        let start = slot.index * self.slot_size;
        Ok(start..start + self.slot_size)
    }

    /// Contents of a live slot
    pub fn bytes(&self, slot: Slot) -> MemoryResult<&[u8]> {
        let range = self.live(slot)?;
        self.region.bytes(range)
    }

    /// Mutable contents of a live slot
    pub fn bytes_mut(&mut self, slot: Slot) -> MemoryResult<&mut [u8]> {
        let range = self.live(slot)?;
        self.region.bytes_mut(range)
    }

    /// Raw address of a live slot
    pub fn as_ptr(&self, slot: Slot) -> MemoryResult<NonNull<u8>> {
        let range = self.live(slot)?;
        self.region.ptr_at(range.start)
    }

    /// Bytes per slot
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Number of slots in the region
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Slots currently pushed
    #[inline]
    pub fn taken(&self) -> usize {
        self.taken
    }

    /// Region capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes in pushed slots
    #[inline]
    pub fn used(&self) -> usize {
        self.taken * self.slot_size
    }

    /// Bytes left
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Configuration this stack was created with
    #[inline]
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Counters, if tracking is enabled
    pub fn stats(&self) -> Option<AllocatorStats> {
        self.stats.get()
    }
}

impl<S: PageSource> MemoryUsage for FixedStack<S> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> usize {
        self.available()
    }
}

impl<S: PageSource> Resettable for FixedStack<S> {
    fn reset(&mut self) {
        FixedStack::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SimulatedPages;

    fn stack(slot_size: usize) -> FixedStack<SimulatedPages> {
        FixedStack::with_source(4096, slot_size, SimulatedPages::new(), AllocatorConfig::debug())
            .unwrap()
    }

    #[test]
    fn test_slots_are_sequential() {
        let mut s = stack(64);
        assert_eq!(s.slot_count(), 64);
        assert_eq!(s.alloc().unwrap().index(), 0);
        assert_eq!(s.alloc().unwrap().index(), 1);
        assert_eq!(s.used(), 128);
    }

    #[test]
    fn test_free_pops_the_top() {
        let mut s = stack(64);
        s.alloc().unwrap();
        let top = s.alloc().unwrap();
        assert_eq!(s.free(), Some(top));
        assert_eq!(s.taken(), 1);
        assert_eq!(s.alloc().unwrap(), top);
    }

    #[test]
    fn test_free_on_empty_is_a_noop() {
        let mut s = stack(64);
        assert_eq!(s.free(), None);
        assert_eq!(s.taken(), 0);
        assert_eq!(s.stats().unwrap().deallocations, 0);
    }

    #[test]
    fn test_checked_release_wants_the_top() {
        let mut s = stack(64);
        let a = s.alloc().unwrap();
        let b = s.alloc().unwrap();
        assert!(s.release(a).is_err());
        s.release(b).unwrap();
        s.release(a).unwrap();
        assert!(s.release(a).is_err());
    }

    #[test]
    fn test_exhaustion_and_reset() {
        let mut s = stack(2048);
        let first = s.alloc().unwrap();
        s.alloc().unwrap();
        assert_eq!(s.alloc().unwrap_err().code(), "MEM:STACK:EXHAUSTED");

        s.reset();
        assert_eq!(s.alloc().unwrap(), first);
    }

    #[test]
    fn test_invalid_geometry() {
        let pages = SimulatedPages::new();
        assert!(FixedStack::with_source(4096, 0, pages, AllocatorConfig::default()).is_err());
        assert!(FixedStack::with_source(4096, 3000, pages, AllocatorConfig::default()).is_err());
    }

    #[test]
    fn test_popped_slots_are_not_readable() {
        let mut s = stack(16);
        let a = s.alloc().unwrap();
        s.bytes_mut(a).unwrap().fill(7);
        assert_eq!(s.bytes(a).unwrap(), &[7; 16]);
        s.free();
        assert!(s.bytes(a).is_err());
    }
}
