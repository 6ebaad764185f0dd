//! Core functionality shared by every allocator
//!
//! - Size constants and the machine word size
//! - Usage and reset traits

pub mod traits;
pub mod types;

pub use traits::{BasicMemoryUsage, MemoryUsage, Resettable};
pub use types::*;
