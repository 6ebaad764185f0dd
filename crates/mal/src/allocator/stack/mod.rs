//! LIFO allocators
//!
//! ## Modules
//! - `fixed` - [`FixedStack`], equal-sized slots released top first
//! - `variable` - [`VariableStack`], variable-sized frames linked by a
//!   trailing back-link word

pub mod fixed;
pub mod variable;

pub use fixed::FixedStack;
pub use variable::VariableStack;
