//! Checkpoint support for the arena

/// Saved arena position
///
/// Only valid for the arena that issued it and only until that arena's next
/// `reset`; [`Arena::restore`](super::Arena::restore) checks both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaCheckpoint {
    pub(super) position: usize,
    pub(super) generation: u32,
}

impl ArenaCheckpoint {
    /// Bytes in use when the checkpoint was taken
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }
}
