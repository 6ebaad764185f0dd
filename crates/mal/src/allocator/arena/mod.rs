//! Bump arena over a page-backed region
//!
//! Allocation advances a single cursor; nothing is reused until `reset` (or
//! `restore` to an earlier checkpoint).
//!
//! ## Invariants
//!
//! - `used <= capacity`
//! - Blocks handed out within one generation never overlap and have strictly
//!   increasing offsets
//! - The first allocation after `reset` starts at offset 0
//!
//! No alignment is applied; callers pad explicitly when they need it.

use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::debug;

mod checkpoint;

pub use checkpoint::ArenaCheckpoint;

use super::Block;
use crate::config::AllocatorConfig;
use crate::core::{MemoryUsage, Resettable};
use crate::error::{MemoryError, MemoryResult};
use crate::page::{PageSource, SystemPages};
use crate::region::Region;
use crate::stats::{AllocatorStats, StatsSlot};

const KIND: &str = "arena";

/// Monotonic bump allocator
///
/// # Memory Layout
/// ```text
/// [block0][block1][block2][          free          ]
/// ^0                      ^used                    ^capacity
/// ```
#[derive(Debug)]
pub struct Arena<S: PageSource = SystemPages> {
    region: Region<S>,
    used: usize,
    generation: u32,
    config: AllocatorConfig,
    stats: StatsSlot,
}

impl Arena<SystemPages> {
    /// Arena of at least `capacity` bytes of OS pages
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, AllocatorConfig::default())
    }

    /// Arena of OS pages with a custom configuration
    pub fn with_config(capacity: usize, config: AllocatorConfig) -> MemoryResult<Self> {
        Self::with_source(capacity, SystemPages, config)
    }
}

impl<S: PageSource> Arena<S> {
    /// Arena backed by an arbitrary page source
    ///
    /// The capacity is rounded up to the source's page size.
    pub fn with_source(capacity: usize, source: S, config: AllocatorConfig) -> MemoryResult<Self> {
        let region =
            Region::acquire(capacity, source).map_err(|e| e.escalate(config.failure_mode))?;

        #[cfg(feature = "logging")]
        debug!(capacity = region.len(), "created arena");

        Ok(Self {
            region,
            used: 0,
            generation: 0,
            config,
            stats: StatsSlot::new(config.track_stats),
        })
    }

    /// Bump-allocate `size` bytes
    ///
    /// Zero-sized requests succeed and return an empty block at the cursor.
    pub fn alloc(&mut self, size: usize) -> MemoryResult<Block> {
        let capacity = self.capacity();
        let end = match self.used.checked_add(size) {
            Some(end) if end <= capacity => end,
            _ => {
                self.stats.update(AllocatorStats::record_failure);
                return Err(MemoryError::exhausted(KIND, size, self.available(), capacity)
                    .escalate(self.config.failure_mode));
            }
        };

        let block = Block {
            offset: self.used,
            len: size,
        };
        self.used = end;
        self.stats.update(|s| s.record_alloc(end));
        Ok(block)
    }

    /// Save the current position
    pub fn checkpoint(&self) -> ArenaCheckpoint {
        ArenaCheckpoint {
            position: self.used,
            generation: self.generation,
        }
    }

    /// Roll back to `checkpoint`, dropping every block allocated after it
    ///
    /// Fails if the checkpoint predates a reset or lies ahead of the cursor.
    pub fn restore(&mut self, checkpoint: ArenaCheckpoint) -> MemoryResult<()> {
        if checkpoint.generation != self.generation {
            return Err(MemoryError::precondition(KIND, "checkpoint from a previous generation")
                .escalate(self.config.failure_mode));
        }
        if checkpoint.position > self.used {
            return Err(MemoryError::precondition(KIND, "checkpoint is in the future")
                .escalate(self.config.failure_mode));
        }

        self.poison(checkpoint.position..self.used);
        self.used = checkpoint.position;
        Ok(())
    }

    /// Drop every allocation; memory is not cleared unless a pattern is configured
    pub fn reset(&mut self) {
        self.poison(0..self.used);
        self.used = 0;
        self.generation = self.generation.wrapping_add(1);
        self.stats.update(AllocatorStats::record_reset);

        #[cfg(feature = "logging")]
        debug!(generation = self.generation, "arena reset");
    }

    /// Release the region back to its page source
    pub fn destroy(self) -> MemoryResult<()> {
        let mode = self.config.failure_mode;
        let capacity = self.capacity();
        self.region.release().map_err(|e| e.escalate(mode))?;

        #[cfg(feature = "logging")]
        debug!(capacity, "destroyed arena");
        #[cfg(not(feature = "logging"))]
        let _ = capacity;

        Ok(())
    }

    fn poison(&mut self, range: core::ops::Range<usize>) {
        if let Some(pattern) = self.config.dealloc_pattern {
            // range lies within 0..=used, which never exceeds the region
            let _ = self.region.fill(range, pattern);
        }
    }

    fn live(&self, block: Block) -> MemoryResult<core::ops::Range<usize>> {
        let range = block.range();
        if block.offset > self.used || block.len > self.used - block.offset {
            return Err(MemoryError::precondition(
                KIND,
                format!("block {range:?} is beyond the cursor at {}", self.used),
            ));
        }
        Ok(range)
    }

    /// Contents of `block`
    pub fn bytes(&self, block: Block) -> MemoryResult<&[u8]> {
        let range = self.live(block)?;
        self.region.bytes(range)
    }

    /// Mutable contents of `block`
    pub fn bytes_mut(&mut self, block: Block) -> MemoryResult<&mut [u8]> {
        let range = self.live(block)?;
        self.region.bytes_mut(range)
    }

    /// Raw address of `block` for native consumers
    pub fn as_ptr(&self, block: Block) -> MemoryResult<NonNull<u8>> {
        let range = self.live(block)?;
        self.region.ptr_at(range.start)
    }

    /// Region capacity in bytes (page-rounded)
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes handed out since the last reset
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes left before exhaustion
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.used
    }

    /// Configuration this arena was created with
    #[inline]
    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Counters, if tracking is enabled
    pub fn stats(&self) -> Option<AllocatorStats> {
        self.stats.get()
    }
}

impl<S: PageSource> MemoryUsage for Arena<S> {
    fn used_memory(&self) -> usize {
        self.used
    }

    fn available_memory(&self) -> usize {
        self.available()
    }
}

impl<S: PageSource> Resettable for Arena<S> {
    fn reset(&mut self) {
        Arena::reset(self);
    }
}
