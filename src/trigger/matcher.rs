//! Rolling-window comparison
//!
//! A match means the most recent N keys equal the target exactly, where N is
//! the target length. Unrelated keys typed in between occupy window slots and
//! break the match.

use crate::input::KeyId;

use super::buffer::SequenceBuffer;

/// True iff `snapshot` and `target` have the same length and equal elements
pub fn matches(snapshot: &[KeyId], target: &[KeyId]) -> bool {
    snapshot == target
}

/// Same as `matches(&buffer.snapshot(), target)` without allocating
pub fn window_matches(buffer: &SequenceBuffer, target: &[KeyId]) -> bool {
    buffer.len() == target.len() && buffer.iter().zip(target).all(|(seen, want)| seen == want)
}
