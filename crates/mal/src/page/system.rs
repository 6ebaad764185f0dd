//! OS virtual-memory page source

use std::ptr::NonNull;

#[cfg(feature = "logging")]
use tracing::debug;

use super::{PageSource, page_size};
use crate::error::{MemoryError, MemoryResult};
use crate::syscalls;

/// Pages mapped straight from the operating system
///
/// Anonymous private mappings are zero-filled by the kernel, which is what
/// the [`PageSource`] contract asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemPages;

// SAFETY: map_anonymous returns page-aligned, zero-filled, exclusively owned
// anonymous mappings of exactly `len` bytes; release unmaps with the same length.
unsafe impl PageSource for SystemPages {
    fn page_size(&self) -> usize {
        page_size()
    }

    fn acquire(&self, len: usize) -> MemoryResult<NonNull<u8>> {
        let start = syscalls::map_anonymous(len)
            .map_err(|e| MemoryError::backing_failed("acquire", len, e.to_string()))?;

        #[cfg(feature = "logging")]
        debug!(len, start = ?start, "mapped region");

        Ok(start)
    }

    unsafe fn release(&self, start: NonNull<u8>, len: usize) -> MemoryResult<()> {
        // SAFETY: caller guarantees start/len come from one acquire on this source.
        unsafe { syscalls::unmap(start, len) }
            .map_err(|e| MemoryError::backing_failed("release", len, e.to_string()))?;

        #[cfg(feature = "logging")]
        debug!(len, start = ?start, "unmapped region");

        Ok(())
    }
}
