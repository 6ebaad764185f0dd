//! Region-backed allocators
//!
//! ## Modules
//! - `arena` - bump allocation, freed all at once
//! - `pool` - fixed-size slots, freed in any order
//! - `stack` - fixed-slot and variable-frame LIFO stacks
//! - `general` - placeholder for a general-purpose allocator
//! - `handle` - offset handles returned by the allocators
//!
//! Every allocator owns one [`Region`](crate::region::Region), is generic
//! over its [`PageSource`](crate::page::PageSource), and is single-threaded:
//! operations take `&mut self`.

pub mod arena;
pub mod general;
pub mod handle;
pub mod pool;
pub mod stack;

pub use arena::{Arena, ArenaCheckpoint};
pub use general::GeneralAllocator;
pub use handle::{Block, Frame, Slot};
pub use pool::Pool;
pub use stack::{FixedStack, VariableStack};
