//! Fixed-slot pool over a page-backed region
//!
//! Slots can be freed in any order. Free slots are chained through an
//! intrusive list whose links are slot-count deltas stored in the slots
//! themselves (see [`free_list`]), so the pool needs no side table and a
//! freshly zeroed region needs no initialization.
//!
//! ## Invariants
//!
//! - `capacity == slot_count * slot_size`, `slot_size >= WORD_SIZE`
//! - `taken <= slot_count`
//! - The most recently freed slot is the next one handed out
//! - Link words are only read while their slot is free
//! - Slots at or above `high_water` have never been handed out and still
//!   hold a zero link

use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::debug;

mod free_list;

use super::Slot;
use crate::config::AllocatorConfig;
use crate::core::{MemoryUsage, Resettable, WORD_SIZE};
use crate::error::{MemoryError, MemoryResult};
use crate::page::{PageSource, SystemPages};
use crate::region::Region;
use crate::stats::{AllocatorStats, StatsSlot};

const KIND: &str = "pool";

/// Fixed-size slot allocator with out-of-order free
///
/// # Memory Layout
/// ```text
/// [slot0][slot1][slot2][slot3]...[slotN-1]
///          ^free_head (first word of each free slot = link delta)
/// ```
#[derive(Debug)]
pub struct Pool<S: PageSource = SystemPages> {
    region: Region<S>,
    slot_size: usize,
    slot_count: usize,
    /// First free slot; `slot_count` when none is left
    free_head: usize,
    taken: usize,
    high_water: usize,
    config: AllocatorConfig,
    stats: StatsSlot,
}

impl Pool<SystemPages> {
    /// Pool of at least `capacity` bytes of OS pages, split into `slot_size` slots
    pub fn new(capacity: usize, slot_size: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, slot_size, AllocatorConfig::default())
    }

    /// Pool of OS pages with a custom configuration
    pub fn with_config(
        capacity: usize,
        slot_size: usize,
        config: AllocatorConfig,
    ) -> MemoryResult<Self> {
        Self::with_source(capacity, slot_size, SystemPages, config)
    }
}

impl<S: PageSource> Pool<S> {
    /// Pool backed by an arbitrary page source
    ///
    /// `slot_size` is raised to at least one machine word. The page-rounded
    /// capacity must be an exact multiple of the final slot size.
    ///
    /// # Errors
    /// - `InvalidConfig` if the capacity is zero or does not divide into slots
    /// - `BackingAllocationFailed` if the page source refuses the region
    pub fn with_source(
        capacity: usize,
        slot_size: usize,
        source: S,
        config: AllocatorConfig,
    ) -> MemoryResult<Self> {
        let slot_size = slot_size.max(WORD_SIZE);
        let region =
            Region::acquire(capacity, source).map_err(|e| e.escalate(config.failure_mode))?;

        if region.len() % slot_size != 0 {
            return Err(MemoryError::invalid_config(format!(
                "region of {} bytes is not a multiple of slot size {slot_size}",
                region.len()
            ))
            .escalate(config.failure_mode));
        }
        let slot_count = region.len() / slot_size;

        #[cfg(feature = "logging")]
        debug!(capacity = region.len(), slot_size, slot_count, "created pool");

        Ok(Self {
            region,
            slot_size,
            slot_count,
            free_head: 0,
            taken: 0,
            high_water: 0,
            config,
            stats: StatsSlot::new(config.track_stats),
        })
    }

    /// Take the slot at the head of the free list
    pub fn alloc(&mut self) -> MemoryResult<Slot> {
        if self.taken == self.slot_count {
            self.stats.update(AllocatorStats::record_failure);
            return Err(
                MemoryError::exhausted(KIND, self.slot_size, 0, self.capacity())
                    .escalate(self.config.failure_mode),
            );
        }

        let head = self.free_head;
        let next = self
            .link_at(head)
            .and_then(|word| {
                free_list::decode(head, word, self.slot_count).ok_or_else(|| {
                    MemoryError::precondition(
                        KIND,
                        format!("free list link in slot {head} leaves the pool"),
                    )
                })
            })
            .map_err(|e| e.escalate(self.config.failure_mode))?;

        self.free_head = next;
        self.taken += 1;
        self.high_water = self.high_water.max(head + 1);
        let used = self.used();
        self.stats.update(|s| s.record_alloc(used));
        Ok(Slot { index: head })
    }

    fn link_at(&self, index: usize) -> MemoryResult<usize> {
        if index >= self.slot_count {
            return Err(MemoryError::precondition(
                KIND,
                format!("free list head {index} is past the last slot"),
            ));
        }
        self.region.read_word(index * self.slot_size)
    }

    /// Return `slot` to the pool; it becomes the next slot handed out
    ///
    /// Freeing a slot that is not currently allocated (double free, or a
    /// slot from another pool with an in-range index) is not detected and
    /// corrupts the free list.
    pub fn free(&mut self, slot: Slot) -> MemoryResult<()> {
        if slot.index >= self.slot_count {
            return Err(MemoryError::precondition(
                KIND,
                format!("slot {} outside pool of {} slots", slot.index, self.slot_count),
            )
            .escalate(self.config.failure_mode));
        }
        if self.taken == 0 {
            return Err(MemoryError::precondition(KIND, "free with no slot taken")
                .escalate(self.config.failure_mode));
        }

        let offset = slot.index * self.slot_size;
        if let Some(pattern) = self.config.dealloc_pattern {
            self.region.fill(offset..offset + self.slot_size, pattern)?;
        }
        self.region
            .write_word(offset, free_list::encode(slot.index, self.free_head))?;

        self.free_head = slot.index;
        self.taken -= 1;
        self.high_water = self.high_water.max(slot.index + 1);
        self.stats.update(AllocatorStats::record_dealloc);
        Ok(())
    }

    /// Make every slot free again, in creation order
    ///
    /// Link words of every slot handed out since the last reset are zeroed,
    /// so allocation after a reset replays the order of a fresh pool. The
    /// cost is proportional to that high-water mark, not to the capacity.
    pub fn reset(&mut self) {
        let touched = self.high_water * self.slot_size;
        if let Some(pattern) = self.config.dealloc_pattern {
            let _ = self.region.fill(0..touched, pattern);
        }
        for offset in (0..touched).step_by(self.slot_size) {
            // offset < high_water * slot_size <= capacity
            let _ = self.region.write_word(offset, 0);
        }

        self.free_head = 0;
        self.taken = 0;
        self.high_water = 0;
        self.stats.update(AllocatorStats::record_reset);

        #[cfg(feature = "logging")]
        debug!(cleared_slots = touched / self.slot_size, "pool reset");
    }

    /// Release the region back to its page source
    pub fn destroy(self) -> MemoryResult<()> {
        let mode = self.config.failure_mode;
        self.region.release().map_err(|e| e.escalate(mode))?;

        #[cfg(feature = "logging")]
        debug!("destroyed pool");

        Ok(())
    }

    fn slot_range(&self, slot: Slot) -> MemoryResult<core::ops::Range<usize>> {
        if !self.contains(slot) {
            return Err(MemoryError::precondition(
                KIND,
                format!("slot {} outside pool of {} slots", slot.index, self.slot_count),
            ));
        }
        let start = slot.index * self.slot_size;
        Ok(start..start + self.slot_size)
    }

    /// Contents of `slot`
    pub fn bytes(&self, slot: Slot) -> MemoryResult<&[u8]> {
        let range = self.slot_range(slot)?;
        self.region.bytes(range)
    }

    /// Mutable contents of `slot`
    pub fn bytes_mut(&mut self, slot: Slot) -> MemoryResult<&mut [u8]> {
        let range = self.slot_range(slot)?;
        self.region.bytes_mut(range)
    }

    /// Raw address of `slot` for native consumers
    pub fn as_ptr(&self, slot: Slot) -> MemoryResult<NonNull<u8>> {
        let range = self.slot_range(slot)?;
        self.region.ptr_at(range.start)
    }

    /// Whether `slot` indexes into this pool
    #[inline]
    pub fn contains(&self, slot: Slot) -> bool {
        slot.index < self.slot_count
    }

    /// Bytes per slot (at least one machine word)
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Number of slots in the region
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Slots currently handed out
    #[inline]
    pub fn taken(&self) -> usize {
        self.taken
    }

    /// Slots still available
    #[inline]
    pub fn free_slots(&self) -> usize {
        self.slot_count - self.taken
    }

    /// No slot left
    #[inline]
    pub fn is_full(&self) -> bool {
        self.taken == self.slot_count
    }

    /// No slot handed out
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.taken == 0
    }

    /// Region capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes in taken slots
    #[inline]
    pub fn used(&self) -> usize {
        self.taken * self.slot_size
    }

    /// Bytes in free slots
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.used()
    }

    /// Configuration this pool was created with
    #[inline]
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Counters, if tracking is enabled
    pub fn stats(&self) -> Option<AllocatorStats> {
        self.stats.get()
    }
}

impl<S: PageSource> MemoryUsage for Pool<S> {
    fn used_memory(&self) -> usize {
        self.used()
    }

    fn available_memory(&self) -> usize {
        self.available()
    }
}

impl<S: PageSource> Resettable for Pool<S> {
    fn reset(&mut self) {
        Pool::reset(self);
    }
}
