//! Handles returned by the allocators
//!
//! Handles are plain positions inside the owning allocator's region, never
//! raw addresses. Resolve them with the allocator's `bytes`, `bytes_mut` or
//! `as_ptr`, which check them against the region bounds.

/// A bump allocation in an [`Arena`](super::Arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl Block {
    /// Byte offset from the start of the region
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for zero-byte allocations
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte range covered by this block
    #[inline]
    pub fn range(&self) -> core::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// A fixed-size slot in a [`Pool`](super::Pool) or [`FixedStack`](super::FixedStack)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub(crate) index: usize,
}

impl Slot {
    /// Slot index; the slot starts at `index * slot_size`
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A live allocation in a [`VariableStack`](super::VariableStack)
///
/// Besides its position a frame records how deep it sits in the stack, which
/// reset generation issued it and a serial unique within its stack, so an
/// out-of-order, popped or pre-reset handle is rejected instead of touching
/// memory that now belongs to another frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame {
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) depth: usize,
    pub(crate) generation: u32,
    pub(crate) serial: u64,
}

impl Frame {
    /// Byte offset of the payload
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Payload length in bytes (the trailing back-link is not included)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for zero-byte payloads
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 1 for the bottom frame, `depth()` of the stack for the top one
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Payload byte range
    #[inline]
    pub fn range(&self) -> core::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}
