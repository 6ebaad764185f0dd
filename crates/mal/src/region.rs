//! Owned, bounds-tracked backing region
//!
//! A [`Region`] is one contiguous mapping taken from a [`PageSource`]. It is
//! the only place in the crate that touches raw memory; allocators speak in
//! byte offsets and every access is checked against the region length.
//!
//! ```text
//! start                                            start + len
//!   |<------------------ len (page multiple) ------------------>|
//! ```

use core::mem::ManuallyDrop;
use core::ops::Range;
use core::ptr::{self, NonNull};

#[cfg(feature = "logging")]
use tracing::{debug, error};

use crate::core::WORD_SIZE;
use crate::error::{MemoryError, MemoryResult};
use crate::page::{PageSource, SystemPages};

/// A page-rounded block of memory owned by one allocator
pub struct Region<S: PageSource = SystemPages> {
    start: NonNull<u8>,
    len: usize,
    source: S,
}

// SAFETY: Region exclusively owns its mapping; nothing else aliases it, so
// moving it to another thread moves sole access along with it.
unsafe impl<S: PageSource + Send> Send for Region<S> {}

impl<S: PageSource> Region<S> {
    /// Acquire at least `capacity` bytes from `source`
    ///
    /// The length is rounded up to the source's page size. Zero capacity is
    /// rejected: an empty mapping is not a region.
    pub fn acquire(capacity: usize, source: S) -> MemoryResult<Self> {
        if capacity == 0 {
            return Err(MemoryError::invalid_config("region capacity must be non-zero"));
        }

        let len = source.round_up(capacity)?;
        let start = source.acquire(len)?;

        #[cfg(feature = "logging")]
        debug!(requested = capacity, len, "acquired region");

        Ok(Self { start, len, source })
    }

    /// Region length in bytes (a multiple of the page size)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`; kept for API symmetry with slices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Page source backing this region
    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Pointer to the first byte of the region
    #[inline]
    pub fn as_ptr(&self) -> NonNull<u8> {
        self.start
    }

    fn check(&self, range: &Range<usize>) -> MemoryResult<()> {
        if range.start > range.end || range.end > self.len {
            return Err(MemoryError::precondition(
                "region",
                format!(
                    "range {}..{} outside region of {} bytes",
                    range.start, range.end, self.len
                ),
            ));
        }
        Ok(())
    }

    /// Pointer to byte `offset`; `offset == len` (one past the end) is allowed
    pub fn ptr_at(&self, offset: usize) -> MemoryResult<NonNull<u8>> {
        self.check(&(offset..offset))?;
        // SAFETY: offset <= len, so the result stays within (or one past) the mapping.
        Ok(unsafe { self.start.add(offset) })
    }

    /// Shared view of `range`
    pub fn bytes(&self, range: Range<usize>) -> MemoryResult<&[u8]> {
        self.check(&range)?;
        // SAFETY: range is inside the mapping, which is valid and initialized
        // (zero-filled at acquire) for `len` bytes; &self forbids mutation.
        Ok(unsafe {
            core::slice::from_raw_parts(self.start.as_ptr().add(range.start), range.len())
        })
    }

    /// Exclusive view of `range`
    pub fn bytes_mut(&mut self, range: Range<usize>) -> MemoryResult<&mut [u8]> {
        self.check(&range)?;
        // SAFETY: as in `bytes`; &mut self guarantees the view is unique.
        Ok(unsafe {
            core::slice::from_raw_parts_mut(self.start.as_ptr().add(range.start), range.len())
        })
    }

    /// Read the machine word stored at `offset` (no alignment requirement)
    pub fn read_word(&self, offset: usize) -> MemoryResult<usize> {
        let end = offset
            .checked_add(WORD_SIZE)
            .ok_or_else(|| MemoryError::size_overflow("word read"))?;
        let mut word = [0u8; WORD_SIZE];
        word.copy_from_slice(self.bytes(offset..end)?);
        Ok(usize::from_ne_bytes(word))
    }

    /// Store a machine word at `offset` (no alignment requirement)
    pub fn write_word(&mut self, offset: usize, word: usize) -> MemoryResult<()> {
        let end = offset
            .checked_add(WORD_SIZE)
            .ok_or_else(|| MemoryError::size_overflow("word write"))?;
        self.bytes_mut(offset..end)?
            .copy_from_slice(&word.to_ne_bytes());
        Ok(())
    }

    /// Fill `range` with `byte`
    pub fn fill(&mut self, range: Range<usize>, byte: u8) -> MemoryResult<()> {
        self.bytes_mut(range)?.fill(byte);
        Ok(())
    }

    /// Give the mapping back to the page source
    ///
    /// Consumes the region, so it cannot be used or released again.
    pub fn release(self) -> MemoryResult<()> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so `source` is moved out exactly once.
        let source = unsafe { ptr::read(&this.source) };
        // SAFETY: start/len are the values returned by acquire on this source,
        // and ManuallyDrop keeps Drop from releasing them a second time.
        let result = unsafe { source.release(this.start, this.len) };

        #[cfg(feature = "logging")]
        if result.is_ok() {
            debug!(len = this.len, "released region");
        }

        result
    }
}

impl<S: PageSource> Drop for Region<S> {
    fn drop(&mut self) {
        // SAFETY: start/len came from acquire on this source; drop runs once
        // and `release(self)` bypasses it.
        if let Err(e) = unsafe { self.source.release(self.start, self.len) } {
            #[cfg(feature = "logging")]
            error!(len = self.len, "failed to release region on drop: {}", e);
            #[cfg(not(feature = "logging"))]
            let _ = e;
        }
    }
}

impl<S: PageSource + core::fmt::Debug> core::fmt::Debug for Region<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Region")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SimulatedPages;

    fn region(capacity: usize) -> Region<SimulatedPages> {
        Region::acquire(capacity, SimulatedPages::new()).unwrap()
    }

    #[test]
    fn test_capacity_is_page_rounded() {
        assert_eq!(region(1).len(), 4096);
        assert_eq!(region(4097).len(), 8192);
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let err = Region::acquire(0, SimulatedPages::new()).unwrap_err();
        assert_eq!(err.code(), "MEM:CONFIG:INVALID");
    }

    #[test]
    fn test_words_roundtrip_unaligned() {
        let mut r = region(64);
        r.write_word(3, 0xDEAD_BEEF).unwrap();
        assert_eq!(r.read_word(3).unwrap(), 0xDEAD_BEEF);
        assert_eq!(r.read_word(100).unwrap(), 0);
    }

    #[test]
    fn test_out_of_bounds_access_is_rejected() {
        let mut r = region(64);
        let len = r.len();
        assert!(r.bytes(len - 1..len + 1).is_err());
        assert!(r.read_word(len - 1).is_err());
        assert!(r.write_word(usize::MAX - 2, 1).is_err());
        assert!(r.ptr_at(len).is_ok());
        assert!(r.ptr_at(len + 1).is_err());
    }

    #[test]
    fn test_fresh_region_is_zeroed() {
        let r = region(4096);
        assert!(r.bytes(0..4096).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fill_and_release() {
        let mut r = region(128);
        r.fill(0..16, 0xAB).unwrap();
        assert_eq!(r.bytes(0..16).unwrap(), &[0xAB; 16]);
        assert_eq!(r.bytes(16..17).unwrap(), &[0]);
        r.release().unwrap();
    }

    #[test]
    fn test_backing_failure_surfaces_on_acquire() {
        let err = Region::acquire(8192, SimulatedPages::new().with_limit(4096)).unwrap_err();
        assert!(matches!(err, MemoryError::BackingAllocationFailed { .. }));
    }
}
