//! General-purpose variable-size allocator (not implemented)
//!
//! Exposes the same create/alloc/free/reset/destroy shape as the other
//! allocators so callers can be written against it, but every entry point
//! fails with [`MemoryError::Unimplemented`], or aborts under
//! [`FailureMode::Abort`](crate::config::FailureMode::Abort).

use super::Block;
use crate::config::AllocatorConfig;
use crate::error::{MemoryError, MemoryResult};

const FEATURE: &str = "general-purpose allocator";

/// Placeholder for a size-class allocator with coalescing free lists
#[derive(Debug)]
pub struct GeneralAllocator {
    config: AllocatorConfig,
}

impl GeneralAllocator {
    /// Always fails
    pub fn new(capacity: usize) -> MemoryResult<Self> {
        Self::with_config(capacity, AllocatorConfig::default())
    }

    /// Always fails
    pub fn with_config(_capacity: usize, config: AllocatorConfig) -> MemoryResult<Self> {
        Err(MemoryError::unimplemented(FEATURE).escalate(config.failure_mode))
    }

    fn fail<T>(&self) -> MemoryResult<T> {
        Err(MemoryError::unimplemented(FEATURE).escalate(self.config.failure_mode))
    }

    /// Always fails
    pub fn alloc(&mut self, _size: usize) -> MemoryResult<Block> {
        self.fail()
    }

    /// Always fails
    pub fn free(&mut self, _block: Block) -> MemoryResult<()> {
        self.fail()
    }

    /// Always fails
    pub fn reset(&mut self) -> MemoryResult<()> {
        self.fail()
    }

    /// Always fails
    pub fn destroy(self) -> MemoryResult<()> {
        self.fail()
    }
}
