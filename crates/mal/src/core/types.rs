//! Common types and constants for region-backed allocation

/// Memory size constants
pub mod size {
    /// 1 Kilobyte
    pub const KB: usize = 1024;

    /// 1 Megabyte
    pub const MB: usize = 1024 * KB;

    /// 1 Gigabyte
    pub const GB: usize = 1024 * MB;
}

/// Bytes in one machine word
///
/// Pool link deltas and variable-stack back-links are stored as one word.
pub const WORD_SIZE: usize = size_of::<usize>();

/// Page size used by [`SimulatedPages`](crate::page::SimulatedPages)
pub const SIM_PAGE_SIZE: usize = 4 * size::KB;

/// Convert kilobytes to bytes
#[inline]
pub const fn kb(n: usize) -> usize {
    n * size::KB
}

/// Convert megabytes to bytes
#[inline]
pub const fn mb(n: usize) -> usize {
    n * size::MB
}

/// Convert gigabytes to bytes
#[inline]
pub const fn gb(n: usize) -> usize {
    n * size::GB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_helpers() {
        assert_eq!(kb(4), 4096);
        assert_eq!(mb(1), 1024 * 1024);
        assert_eq!(gb(1), 1024 * mb(1));
        assert_eq!(SIM_PAGE_SIZE, kb(4));
    }
}
