//! Fixed-capacity ring of the most recent keys

use crate::input::KeyId;

/// Bounded, insertion-ordered record of recent keys
///
/// Storage is allocated once; a full buffer overwrites its oldest slot.
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    slots: Vec<Option<KeyId>>,
    /// Next slot to write
    cursor: usize,
    len: usize,
}

impl SequenceBuffer {
    /// Create an empty buffer holding at most `capacity` keys
    ///
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            cursor: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a key, evicting the oldest one when full
    pub fn push(&mut self, key: KeyId) {
        self.slots[self.cursor] = Some(key);
        self.cursor = (self.cursor + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    /// Current contents, oldest first
    pub fn snapshot(&self) -> Vec<KeyId> {
        self.iter().cloned().collect()
    }

    /// Empty the buffer without releasing storage
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.cursor = 0;
        self.len = 0;
    }

    /// Iterate contents oldest first
    pub fn iter(&self) -> impl Iterator<Item = &KeyId> + '_ {
        let capacity = self.capacity();
        let start = (self.cursor + capacity - self.len) % capacity;
        (0..self.len).filter_map(move |offset| self.slots[(start + offset) % capacity].as_ref())
    }
}
