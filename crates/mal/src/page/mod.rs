//! Page sources: where regions come from
//!
//! A [`PageSource`] hands out committed, zero-filled, page-aligned memory and
//! takes it back. Every allocator in this crate is generic over one, with
//! [`SystemPages`] (the OS virtual-memory API) as the default.
//!
//! The OS page size is resolved once per process, either by [`crate::init`]
//! or lazily on the first call to [`page_size`].

use std::ptr::NonNull;
use std::sync::OnceLock;

#[cfg(feature = "logging")]
use tracing::debug;

use crate::error::{MemoryError, MemoryResult};
use crate::syscalls;

mod simulated;
mod system;

pub use simulated::SimulatedPages;
pub use system::SystemPages;

static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// OS page granularity in bytes, memoized for the life of the process
pub fn page_size() -> usize {
    *PAGE_SIZE.get_or_init(|| {
        let size = syscalls::get_page_size();
        assert!(
            syscalls::is_plausible_page_size(size),
            "OS reported an invalid page size: {size}"
        );

        #[cfg(feature = "logging")]
        debug!(page_size = size, "resolved OS page size");

        size
    })
}

/// Round `n` up to the next multiple of the OS page size
///
/// Idempotent, never smaller than `n`, and always a multiple of
/// [`page_size`]. `0` rounds to `0`.
pub fn round_up_to_page_multiple(n: usize) -> MemoryResult<usize> {
    round_up_to_multiple(n, page_size())
}

/// Round `n` up to the next multiple of `granularity`
pub fn round_up_to_multiple(n: usize, granularity: usize) -> MemoryResult<usize> {
    if granularity == 0 {
        return Err(MemoryError::invalid_config("granularity must be non-zero"));
    }
    n.div_ceil(granularity)
        .checked_mul(granularity)
        .ok_or_else(|| MemoryError::size_overflow("page rounding"))
}

/// Backing store for allocator regions
///
/// # Safety
///
/// Implementors must guarantee that a successful `acquire(len)` returns a
/// pointer that is:
/// - aligned to `page_size()`
/// - valid for reads and writes of `len` bytes
/// - zero-filled
/// - exclusively owned by the caller until passed back to `release`
///
/// Allocators rely on the zero fill: a fresh pool region decodes as a
/// sequential free list without any initialization pass.
pub unsafe trait PageSource {
    /// Page granularity of this source in bytes (a power of two)
    fn page_size(&self) -> usize;

    /// Acquire `len` bytes; `len` is already a non-zero multiple of `page_size()`
    fn acquire(&self, len: usize) -> MemoryResult<NonNull<u8>>;

    /// Return a region to the source
    ///
    /// # Safety
    ///
    /// - `start` and `len` must come from one successful `acquire` on this source
    /// - the region must not be released twice or touched afterwards
    unsafe fn release(&self, start: NonNull<u8>, len: usize) -> MemoryResult<()>;

    /// Round a requested capacity up to this source's page granularity
    fn round_up(&self, capacity: usize) -> MemoryResult<usize> {
        round_up_to_multiple(capacity, self.page_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_memoized() {
        let first = page_size();
        assert_eq!(first, page_size());
        assert!(first.is_power_of_two());
    }

    #[test]
    fn test_rounding_examples() {
        assert_eq!(round_up_to_multiple(0, 4096).unwrap(), 0);
        assert_eq!(round_up_to_multiple(1, 4096).unwrap(), 4096);
        assert_eq!(round_up_to_multiple(4096, 4096).unwrap(), 4096);
        assert_eq!(round_up_to_multiple(4097, 4096).unwrap(), 8192);
    }

    #[test]
    fn test_rounding_reports_overflow() {
        let err = round_up_to_multiple(usize::MAX, 4096).unwrap_err();
        assert!(matches!(err, MemoryError::SizeOverflow { .. }));
    }

    #[test]
    fn test_zero_granularity_is_rejected() {
        assert!(round_up_to_multiple(10, 0).is_err());
    }

    #[test]
    fn test_page_rounding_uses_os_page() {
        let page = page_size();
        assert_eq!(round_up_to_page_multiple(page + 1).unwrap(), 2 * page);
    }
}
