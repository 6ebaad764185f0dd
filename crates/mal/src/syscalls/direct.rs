//! Anonymous page mapping
//!
//! Thin wrappers over the OS virtual-memory calls used by
//! [`SystemPages`](crate::page::SystemPages):
//! - Unix: `mmap(MAP_PRIVATE | MAP_ANONYMOUS)` / `munmap`
//! - Windows: `VirtualAlloc(MEM_COMMIT | MEM_RESERVE)` / `VirtualFree(MEM_RELEASE)`
//! - Elsewhere: page-aligned `alloc_zeroed` / `dealloc`
//!
//! Every mapping is read-write, committed and zero-filled. A mapping must be
//! unmapped once, with the length it was mapped with.

use std::io;
use std::ptr::NonNull;

/// Map `size` bytes of private, zero-filled, read-write memory
///
/// The address is chosen by the OS and is page-aligned. `size == 0` is an
/// `InvalidInput` error on every platform.
pub fn map_anonymous(size: usize) -> io::Result<NonNull<u8>> {
    if size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "cannot map a zero-length region",
        ));
    }

    #[cfg(unix)]
    {
        use libc::{MAP_ANONYMOUS, MAP_FAILED, MAP_PRIVATE, PROT_READ, PROT_WRITE};

        // SAFETY: null hint, non-zero length, no backing file (fd -1, offset 0).
        // The kernel either returns a fresh mapping or MAP_FAILED.
        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                PROT_READ | PROT_WRITE,
                MAP_PRIVATE | MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if addr == MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        NonNull::new(addr.cast::<u8>()).ok_or_else(|| io::Error::other("mmap returned null"))
    }

    #[cfg(windows)]
    {
        use winapi::um::winnt::{MEM_COMMIT, MEM_RESERVE, PAGE_READWRITE};

        // SAFETY: null hint and non-zero length; committed pages are zeroed
        // by the OS. Null signals failure.
        let addr = unsafe {
            winapi::um::memoryapi::VirtualAlloc(
                std::ptr::null_mut(),
                size,
                MEM_COMMIT | MEM_RESERVE,
                PAGE_READWRITE,
            )
        };
        NonNull::new(addr.cast::<u8>()).ok_or_else(io::Error::last_os_error)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let layout = fallback_layout(size)?;
        // SAFETY: layout size is non-zero.
        let addr = unsafe { std::alloc::alloc_zeroed(layout) };
        NonNull::new(addr).ok_or_else(|| io::Error::from(io::ErrorKind::OutOfMemory))
    }
}

/// Undo a [`map_anonymous`]
///
/// # Safety
///
/// `addr` and `size` must come from one successful `map_anonymous` call, the
/// region must not be unmapped twice, and nothing may touch it afterwards.
pub unsafe fn unmap(addr: NonNull<u8>, size: usize) -> io::Result<()> {
    #[cfg(unix)]
    {
        // SAFETY: guaranteed by the caller.
        if unsafe { libc::munmap(addr.as_ptr().cast(), size) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(windows)]
    {
        let _ = size;
        // SAFETY: guaranteed by the caller; MEM_RELEASE takes a zero length
        // and frees the whole allocation.
        let ok = unsafe {
            winapi::um::memoryapi::VirtualFree(
                addr.as_ptr().cast(),
                0,
                winapi::um::winnt::MEM_RELEASE,
            )
        };
        if ok != 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        let layout = fallback_layout(size)?;
        // SAFETY: guaranteed by the caller; map_anonymous used this layout.
        unsafe { std::alloc::dealloc(addr.as_ptr(), layout) };
        Ok(())
    }
}

#[cfg(not(any(unix, windows)))]
fn fallback_layout(size: usize) -> io::Result<std::alloc::Layout> {
    std::alloc::Layout::from_size_align(size, super::get_page_size())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_is_zeroed_and_writable() {
        let size = super::super::get_page_size() * 2;
        let addr = map_anonymous(size).expect("map failed");

        // SAFETY: addr is valid for size bytes until unmapped below.
        unsafe {
            let bytes = std::slice::from_raw_parts_mut(addr.as_ptr(), size);
            assert!(bytes.iter().all(|&b| b == 0));
            bytes[size - 1] = 0x7F;
            assert_eq!(bytes[size - 1], 0x7F);
            unmap(addr, size).expect("unmap failed");
        }
    }

    #[test]
    fn test_zero_length_is_rejected() {
        let err = map_anonymous(0).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
