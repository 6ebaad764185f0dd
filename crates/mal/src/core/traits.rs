//! Core traits shared by the allocators

/// Memory usage tracking trait
///
/// Implemented by every allocator in this crate. Regions never grow, so the
/// total is always known.
pub trait MemoryUsage {
    /// Get currently used memory in bytes
    fn used_memory(&self) -> usize;

    /// Get available memory in bytes
    fn available_memory(&self) -> usize;

    /// Get total memory capacity in bytes
    fn total_memory(&self) -> usize {
        self.used_memory() + self.available_memory()
    }

    /// Returns memory usage as a percentage (0.0 to 100.0)
    fn memory_usage_percent(&self) -> f32 {
        let total = self.total_memory();
        if total == 0 {
            0.0
        } else {
            (self.used_memory() as f32 / total as f32) * 100.0
        }
    }

    /// Returns a snapshot of the usage figures
    fn memory_usage(&self) -> BasicMemoryUsage {
        BasicMemoryUsage {
            used: self.used_memory(),
            available: self.available_memory(),
            total: self.total_memory(),
        }
    }
}

/// Basic memory usage information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicMemoryUsage {
    /// Currently used memory in bytes
    pub used: usize,
    /// Available memory in bytes
    pub available: usize,
    /// Total memory capacity in bytes
    pub total: usize,
}

impl core::fmt::Display for BasicMemoryUsage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "used: {} bytes, total: {} bytes", self.used, self.total)
    }
}

/// Allocators that can drop every live allocation at once
///
/// Reset takes `&mut self`: handles are plain offsets, so no borrow into the
/// region can outlive it. Handles issued before the reset stay in bounds but
/// no longer name live allocations.
pub trait Resettable {
    /// Reset allocator to its freshly created state
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        used: usize,
        total: usize,
    }

    impl MemoryUsage for Fixed {
        fn used_memory(&self) -> usize {
            self.used
        }

        fn available_memory(&self) -> usize {
            self.total - self.used
        }
    }

    #[test]
    fn test_usage_percent() {
        let usage = Fixed {
            used: 1024,
            total: 4096,
        };
        assert_eq!(usage.total_memory(), 4096);
        assert_eq!(usage.memory_usage_percent(), 25.0);
        assert_eq!(
            usage.memory_usage().to_string(),
            "used: 1024 bytes, total: 4096 bytes"
        );
    }

    #[test]
    fn test_empty_total_is_zero_percent() {
        let usage = Fixed { used: 0, total: 0 };
        assert_eq!(usage.memory_usage_percent(), 0.0);
    }
}
