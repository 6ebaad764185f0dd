//! Offset-encoded intrusive free list
//!
//! A free slot stores one word: the signed number of slots to skip, minus
//! one, to reach the next free slot. Zeroed memory therefore decodes as
//! "the next slot in order", so a fresh region is already a complete free
//! list.
//!
//! ```text
//! index:  0    1    2    3    4
//! link:  [0]  [0]  [0]  [0]  [0]     head = 0  ->  0, 1, 2, 3, 4
//!
//! after alloc x3, free(1):
//! link:  [..] [1]  [..] [0]  [0]     head = 1  ->  1, 3, 4
//! ```

/// Link word to store in a slot at `index` that becomes the new head in
/// front of `head`
#[inline]
pub(super) fn encode(index: usize, head: usize) -> usize {
    let delta = (head as isize).wrapping_sub(index as isize);
    delta.wrapping_sub(1) as usize
}

/// Next head after taking `head`, whose link word is `word`
///
/// `None` when the link points outside `0..=slot_count`; that only happens
/// if a free slot's link word was overwritten.
#[inline]
pub(super) fn decode(head: usize, word: usize, slot_count: usize) -> Option<usize> {
    let next = (head as isize)
        .checked_add(word as isize)?
        .checked_add(1)?;
    usize::try_from(next).ok().filter(|&n| n <= slot_count)
}
