//! Page granularity query
//!
//! # Safety
//!
//! This module uses platform-specific syscalls to query the page size:
//! - Unix: `libc::sysconf(_SC_PAGESIZE)`
//! - Windows: `GetSystemInfo` with a zeroed `SYSTEM_INFO` structure

use crate::core::SIM_PAGE_SIZE;

/// Get page size using platform-specific syscalls
///
/// Uncached; callers go through [`crate::page::page_size`], which memoizes it.
/// Returns 0 if the OS query fails.
pub fn get_page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: FFI call to libc::sysconf.
        // - _SC_PAGESIZE is a valid sysconf parameter
        // - sysconf returns page size or -1 on error
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        usize::try_from(size).unwrap_or(0)
    }

    #[cfg(windows)]
    {
        use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};

        // SAFETY: FFI call to Windows GetSystemInfo.
        // - SYSTEM_INFO initialized with zeroed() (all zero bytes are valid)
        // - GetSystemInfo fills the structure with valid system information
        // - dwPageSize field contains the page size
        unsafe {
            let mut info: SYSTEM_INFO = std::mem::zeroed();
            GetSystemInfo(&mut info);
            info.dwPageSize as usize
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        SIM_PAGE_SIZE
    }
}

/// Whether `size` looks like a real page size
#[inline]
pub(crate) fn is_plausible_page_size(size: usize) -> bool {
    size >= SIM_PAGE_SIZE / 8 && size.is_power_of_two()
}
