//! Region-backed memory allocators
//!
//! Each allocator owns one contiguous block of OS pages and implements one
//! allocation strategy over it, with no general-purpose heap underneath:
//!
//! - [`Arena`] - bump allocation, released all at once
//! - [`Pool`] - fixed-size slots freed in any order through an intrusive,
//!   offset-encoded free list
//! - [`FixedStack`] - fixed-size slots released in LIFO order
//! - [`VariableStack`] - variable-size frames released in LIFO order
//!
//! Allocators hand out offset handles ([`Block`], [`Slot`], [`Frame`]) instead
//! of raw addresses; every access through them is bounds-checked against the
//! owning region. Pages come from a [`PageSource`], by default the OS
//! ([`SystemPages`]).
//!
//! # Features
//!
//! - `logging` (default): `tracing` events for region and allocator lifecycle
//! - `abort-on-failure`: make [`FailureMode::Abort`] the default failure mode
//!
//! # Example
//!
//! ```no_run
//! use mal::prelude::*;
//!
//! fn main() -> mal::Result<()> {
//!     mal::init()?;
//!
//!     let mut pool = Pool::new(4096, 16)?;
//!     let a = pool.alloc()?;
//!     let b = pool.alloc()?;
//!     pool.bytes_mut(a)?.fill(1);
//!
//!     pool.free(b)?;
//!     assert_eq!(pool.alloc()?, b);
//!
//!     pool.destroy()
//! }
//! ```

#![warn(missing_docs)]
#![allow(unsafe_code)]

pub mod allocator;
pub mod config;
pub mod core;
pub mod error;
pub mod page;
pub mod region;
pub mod stats;
pub mod syscalls;

pub use allocator::{
    Arena, ArenaCheckpoint, Block, FixedStack, Frame, GeneralAllocator, Pool, Slot, VariableStack,
};
pub use config::{AllocatorConfig, FailureMode};
pub use error::{MemoryError, MemoryResult, Result};
pub use page::{PageSource, SimulatedPages, SystemPages, page_size, round_up_to_page_multiple};
pub use region::Region;
pub use stats::AllocatorStats;

/// Commonly used types
pub mod prelude {
    pub use crate::allocator::{
        Arena, Block, FixedStack, Frame, GeneralAllocator, Pool, Slot, VariableStack,
    };
    pub use crate::config::{AllocatorConfig, FailureMode};
    pub use crate::core::{MemoryUsage, Resettable};
    pub use crate::error::{MemoryError, MemoryResult};
    pub use crate::page::{PageSource, SimulatedPages, SystemPages};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the allocator subsystem
///
/// Resolves and caches the OS page size. Optional: the first allocator
/// created does the same lazily. Call it at startup to keep that query off
/// the first allocation path.
///
/// # Example
///
/// ```no_run
/// fn main() -> mal::Result<()> {
///     mal::init()?;
///     // Your application code here
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    let size = page_size();

    #[cfg(feature = "logging")]
    tracing::info!(page_size = size, version = VERSION, "mal initialized");
    #[cfg(not(feature = "logging"))]
    let _ = size;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        init().unwrap();
        init().unwrap();
        assert!(page_size() > 0);
        assert!(!VERSION.is_empty());
    }
}
