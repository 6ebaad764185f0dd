//! Variable-size LIFO stack
//!
//! Every frame is its payload followed by one back-link word holding the
//! payload's start offset. Popping reads the word just below the top to find
//! where the most recent frame began.
//!
//! ```text
//! [payload0][link=0][payload1][link=o1][payload2][link=o2]
//! ^0                ^o1                ^o2               ^top
//! ```
//!
//! `free` trusts the caller to pop in reverse allocation order. `release`
//! and the payload accessors check the frame handle against the serials of
//! the live frames and report a mismatch instead of touching the wrong frame.

use core::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::debug;

use crate::allocator::Frame;
use crate::config::AllocatorConfig;
use crate::core::{MemoryUsage, Resettable, WORD_SIZE};
use crate::error::{MemoryError, MemoryResult};
use crate::page::{PageSource, SystemPages};
use crate::region::Region;
use crate::stats::{AllocatorStats, StatsSlot};

const KIND: &str = "variable stack";

/// Stack of variable-sized frames
#[derive(Debug)]
pub struct VariableStack<S: PageSource = SystemPages> {
    region: Region<S>,
    /// One past the last back-link; equals bytes used
    top: usize,
    /// Serials of live frames, bottom first
    serials: Vec<u64>,
    next_serial: u64,
    generation: u32,
    config: AllocatorConfig,
    stats: StatsSlot,
}

impl VariableStack<SystemPages> {
    /// Stack of at least `capacity` bytes of OS pages
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, AllocatorConfig::default())
    }

    /// Stack of OS pages with a custom configuration
    pub fn with_config(capacity: usize, config: AllocatorConfig) -> MemoryResult<Self> {
        Self::with_source(capacity, SystemPages, config)
    }
}

impl<S: PageSource> VariableStack<S> {
    /// Stack backed by an arbitrary page source
    pub fn with_source(capacity: usize, source: S, config: AllocatorConfig) -> MemoryResult<Self> {
        let region =
            Region::acquire(capacity, source).map_err(|e| e.escalate(config.failure_mode))?;

        #[cfg(feature = "logging")]
        debug!(capacity = region.len(), "created variable stack");

        Ok(Self {
            region,
            top: 0,
            serials: Vec::new(),
            next_serial: 0,
            generation: 0,
            config,
            stats: StatsSlot::new(config.track_stats),
        })
    }

    /// Push a frame with a `size`-byte payload
    ///
    /// Consumes `size + WORD_SIZE` bytes of the region.
    pub fn alloc(&mut self, size: usize) -> MemoryResult<Frame> {
        let capacity = self.capacity();
        let link = self.top.checked_add(size);
        let end = match link.and_then(|l| l.checked_add(WORD_SIZE)) {
            Some(end) if end <= capacity => end,
            _ => {
                self.stats.update(AllocatorStats::record_failure);
                return Err(
                    MemoryError::exhausted(KIND, size, self.available(), capacity)
                        .escalate(self.config.failure_mode),
                );
            }
        };

        let offset = self.top;
        self.region
            .write_word(end - WORD_SIZE, offset)
            .map_err(|e| e.escalate(self.config.failure_mode))?;
        let serial = self.next_serial;
        self.next_serial += 1;
        self.serials.push(serial);
        self.top = end;
        self.stats.update(|s| s.record_alloc(end));

        Ok(Frame {
            offset,
            len: size,
            depth: self.serials.len(),
            generation: self.generation,
            serial,
        })
    }

    /// Pop the most recent frame; `Ok(None)` on an empty stack
    ///
    /// Returns the frame that was unwound. Fails only if the back-link below
    /// the top was overwritten and no longer points inside the stack.
    pub fn free(&mut self) -> MemoryResult<Option<Frame>> {
        if self.top == 0 {
            return Ok(None);
        }

        let link = self.top - WORD_SIZE;
        let offset = self
            .region
            .read_word(link)
            .and_then(|offset| {
                if offset <= link {
                    Ok(offset)
                } else {
                    Err(MemoryError::precondition(
                        KIND,
                        format!("back-link {offset} above frame end {link}"),
                    ))
                }
            })
            .map_err(|e| e.escalate(self.config.failure_mode))?;

        if let Some(pattern) = self.config.dealloc_pattern {
            let _ = self.region.fill(offset..self.top, pattern);
        }

        let frame = Frame {
            offset,
            len: link - offset,
            depth: self.serials.len(),
            generation: self.generation,
            serial: self.serials.pop().unwrap_or_default(),
        };
        self.top = offset;
        self.stats.update(AllocatorStats::record_dealloc);
        Ok(Some(frame))
    }

    /// Pop `frame`, which must be the most recent live frame
    ///
    /// # Errors
    /// `PreconditionViolation` if `frame` is not the top of the stack, was
    /// already popped, or was issued before the last reset. The stack is left
    /// untouched.
    pub fn release(&mut self, frame: Frame) -> MemoryResult<()> {
        if let Err(reason) = self.check_top(frame) {
            return Err(MemoryError::precondition(KIND, reason).escalate(self.config.failure_mode));
        }
        self.free().map(|_| ())
    }

    fn check_top(&self, frame: Frame) -> Result<(), String> {
        self.check_live(frame)?;
        if frame.depth != self.depth() {
            return Err(format!(
                "frame at depth {} released out of order (stack depth {})",
                frame.depth,
                self.depth()
            ));
        }
        Ok(())
    }

    fn check_live(&self, frame: Frame) -> Result<(), String> {
        if frame.generation != self.generation {
            return Err(format!(
                "frame from generation {} used in generation {}",
                frame.generation, self.generation
            ));
        }
        let current = frame
            .depth
            .checked_sub(1)
            .and_then(|i| self.serials.get(i));
        if current != Some(&frame.serial) {
            return Err(format!("frame at depth {} was already popped", frame.depth));
        }
        Ok(())
    }

    /// Drop every frame
    pub fn reset(&mut self) {
        if let Some(pattern) = self.config.dealloc_pattern {
            let _ = self.region.fill(0..self.top, pattern);
        }
        self.top = 0;
        self.serials.clear();
        self.generation = self.generation.wrapping_add(1);
        self.stats.update(AllocatorStats::record_reset);

        #[cfg(feature = "logging")]
        debug!(generation = self.generation, "variable stack reset");
    }

    /// Release the region back to its page source
    pub fn destroy(self) -> MemoryResult<()> {
        let mode = self.config.failure_mode;
        self.region.release().map_err(|e| e.escalate(mode))?;

        #[cfg(feature = "logging")]
        debug!("destroyed variable stack");

        Ok(())
    }

    fn live(&self, frame: Frame) -> MemoryResult<core::ops::Range<usize>> {
        self.check_live(frame)
            .map_err(|reason| MemoryError::precondition(KIND, reason))?;
        Ok(frame.range())
    }

    /// Payload of a live frame
    pub fn bytes(&self, frame: Frame) -> MemoryResult<&[u8]> {
        let range = self.live(frame)?;
        self.region.bytes(range)
    }

    /// Mutable payload of a live frame
    pub fn bytes_mut(&mut self, frame: Frame) -> MemoryResult<&mut [u8]> {
        let range = self.live(frame)?;
        self.region.bytes_mut(range)
    }

    /// Raw address of a live frame's payload
    pub fn as_ptr(&self, frame: Frame) -> MemoryResult<NonNull<u8>> {
        let range = self.live(frame)?;
        self.region.ptr_at(range.start)
    }

    /// Live frames
    #[inline]
    pub fn depth(&self) -> usize {
        self.serials.len()
    }

    /// Offset one past the last back-link
    #[inline]
    pub fn top(&self) -> usize {
        self.top
    }

    /// Region capacity in bytes
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Bytes consumed by payloads and back-links
    #[inline]
    pub fn used(&self) -> usize {
        self.top
    }

    /// Bytes left, back-link overhead included
    #[inline]
    pub fn available(&self) -> usize {
        self.capacity() - self.top
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

impl<S: PageSource> MemoryUsage for VariableStack<S> {
    fn used_memory(&self) -> usize {
        self.top
    }

    fn available_memory(&self) -> usize {
        self.available()
    }
}

impl<S: PageSource> Resettable for VariableStack<S> {
    fn reset(&mut self) {
        VariableStack::reset(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SimulatedPages;

    fn stack() -> VariableStack<SimulatedPages> {
        VariableStack::with_source(4096, SimulatedPages::new(), AllocatorConfig::debug()).unwrap()
    }

    #[test]
    fn test_frames_carry_a_back_link() {
        let mut s = stack();
        let a = s.alloc(10).unwrap();
        let b = s.alloc(20).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 10 + WORD_SIZE);
        assert_eq!(s.used(), 30 + 2 * WORD_SIZE);
        assert_eq!(s.depth(), 2);
    }

    #[test]
    fn test_three_frames_unwind_to_start() {
        let mut s = stack();
        let frames = [
            s.alloc(10).unwrap(),
            s.alloc(20).unwrap(),
            s.alloc(5).unwrap(),
        ];

        for expected in frames.iter().rev() {
            assert_eq!(s.free().unwrap(), Some(*expected));
        }
        assert_eq!(s.top(), 0);
        assert_eq!(s.used(), 0);
        assert_eq!(s.free().unwrap(), None);
    }

    #[test]
    fn test_checked_release_rejects_out_of_order() {
        let mut s = stack();
        let a = s.alloc(8).unwrap();
        let b = s.alloc(8).unwrap();

        let err = s.release(a).unwrap_err();
        assert_eq!(err.code(), "MEM:PRECONDITION");
        assert_eq!(s.depth(), 2);

        s.release(b).unwrap();
        s.release(a).unwrap();
        assert_eq!(s.used(), 0);
    }

    #[test]
    fn test_stale_frame_after_reset() {
        let mut s = stack();
        let a = s.alloc(16).unwrap();
        s.reset();
        let again = s.alloc(16).unwrap();
        assert_eq!(again.offset(), a.offset());
        assert!(s.release(a).is_err());
        assert!(s.bytes(a).is_err());
        s.release(again).unwrap();
    }

    #[test]
    fn test_popped_frame_cannot_touch_its_successors() {
        let mut s = stack();
        let popped = s.alloc(8).unwrap();
        s.free().unwrap();

        let x = s.alloc(0).unwrap();
        let y = s.alloc(16).unwrap();
        assert_eq!(popped.offset(), x.offset());

        let err = s.bytes_mut(popped).unwrap_err();
        assert_eq!(err.code(), "MEM:PRECONDITION");
        assert!(s.bytes(popped).is_err());
        assert!(s.as_ptr(popped).is_err());
        assert!(s.release(popped).is_err());

        s.release(y).unwrap();
        s.release(x).unwrap();
        assert_eq!(s.top(), 0);
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn test_popped_frame_at_same_depth_is_rejected() {
        let mut s = stack();
        let old = s.alloc(32).unwrap();
        s.free().unwrap();
        let new = s.alloc(32).unwrap();

        assert_eq!((old.offset(), old.depth()), (new.offset(), new.depth()));
        assert!(s.release(old).is_err());
        assert_eq!(s.depth(), 1);
        s.release(new).unwrap();
    }

    #[test]
    fn test_exhaustion_counts_the_link() {
        let mut s = stack();
        let err = s.alloc(4096).unwrap_err();
        assert_eq!(err.code(), "MEM:STACK:EXHAUSTED");
        s.alloc(4096 - WORD_SIZE).unwrap();
        assert_eq!(s.available(), 0);
        assert!(s.alloc(0).is_err());
        assert!(s.alloc(usize::MAX).is_err());
    }

    #[test]
    fn test_payload_access() {
        let mut s = stack();
        let a = s.alloc(4).unwrap();
        s.bytes_mut(a).unwrap().copy_from_slice(b"mal!");
        let b = s.alloc(0).unwrap();
        assert!(b.is_empty());
        assert_eq!(s.bytes(a).unwrap(), b"mal!");
        s.free().unwrap();
        s.free().unwrap();
        assert!(s.bytes(a).is_err());
    }
}
