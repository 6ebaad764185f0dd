//! OS calls backing [`SystemPages`](crate::page::SystemPages)
//!
//! - `direct` - anonymous map/unmap
//! - `info` - page granularity query

mod direct;
mod info;

pub use direct::{map_anonymous, unmap};
pub use info::get_page_size;
pub(crate) use info::is_plausible_page_size;
