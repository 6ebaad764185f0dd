//! Heap-backed page grabber with a fixed page size
//!
//! Stands in for the OS when a test needs a known page size, or when it needs
//! the backing store to refuse a mapping.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use super::PageSource;
use crate::core::SIM_PAGE_SIZE;
use crate::error::{MemoryError, MemoryResult};

/// Simulated page source
///
/// Hands out zeroed, page-aligned heap blocks. An optional limit makes every
/// acquire larger than it fail as if the OS had run out of address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedPages {
    page_size: usize,
    limit: Option<usize>,
}

impl Default for SimulatedPages {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPages {
    /// 4 KiB pages, no limit
    pub const fn new() -> Self {
        Self {
            page_size: SIM_PAGE_SIZE,
            limit: None,
        }
    }

    /// Custom page size; must be a power of two
    pub fn with_page_size(page_size: usize) -> MemoryResult<Self> {
        if !page_size.is_power_of_two() {
            return Err(MemoryError::invalid_config(format!(
                "simulated page size {page_size} is not a power of two"
            )));
        }
        Ok(Self {
            page_size,
            limit: None,
        })
    }

    /// Refuse any single acquire larger than `limit` bytes
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn layout(&self, len: usize) -> MemoryResult<Layout> {
        Layout::from_size_align(len, self.page_size)
            .map_err(|e| MemoryError::invalid_config(e.to_string()))
    }
}

// SAFETY: alloc_zeroed with a page-size alignment yields zeroed, aligned,
// exclusively owned memory of `len` bytes; release deallocates with the same layout.
unsafe impl PageSource for SimulatedPages {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn acquire(&self, len: usize) -> MemoryResult<NonNull<u8>> {
        if len == 0 {
            return Err(MemoryError::backing_failed(
                "acquire",
                len,
                "zero-length region",
            ));
        }
        if let Some(limit) = self.limit {
            if len > limit {
                return Err(MemoryError::backing_failed(
                    "acquire",
                    len,
                    format!("simulated limit of {limit} bytes"),
                ));
            }
        }

        let layout = self.layout(len)?;
        // SAFETY: layout has non-zero size (checked above).
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr).ok_or_else(|| MemoryError::backing_failed("acquire", len, "out of memory"))
    }

    unsafe fn release(&self, start: NonNull<u8>, len: usize) -> MemoryResult<()> {
        let layout = self.layout(len)?;
        // SAFETY: caller guarantees start/len came from acquire, which used this layout.
        unsafe { alloc::dealloc(start.as_ptr(), layout) };
        Ok(())
    }
}
