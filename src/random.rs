//! Injectable randomness for affirmation and script selection.

use rand::Rng;
use std::sync::Mutex;

/// Source of uniform indices.
pub trait RandomSource: Send + Sync {
    /// Return an index in `0..len`. `len` is always at least 1.
    fn index(&self, len: usize) -> usize;
}

/// Thread-local RNG backed source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index(&self, len: usize) -> usize {
        rand::rng().random_range(0..len.max(1))
    }
}

/// Deterministic source that cycles through a fixed sequence of indices.
///
/// Values are reduced modulo `len`, so any sequence is valid for any list.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Vec<usize>,
    cursor: Mutex<usize>,
}

impl SequenceRandom {
    pub fn new(values: Vec<usize>) -> Self {
        Self {
            values,
            cursor: Mutex::new(0),
        }
    }

    /// Always return the same index.
    pub fn fixed(value: usize) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRandom {
    fn index(&self, len: usize) -> usize {
        let len = len.max(1);
        if self.values.is_empty() {
            return 0;
        }
        let mut cursor = match self.cursor.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let value = self.values[*cursor % self.values.len()];
        *cursor += 1;
        value % len
    }
}

/// Pick one element of a non-empty slice.
pub fn choose<'a, T>(random: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(random.index(items.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_random_stays_in_range() {
        let random = ThreadRandom;
        for _ in 0..200 {
            assert!(random.index(4) < 4);
        }
        assert_eq!(random.index(1), 0);
    }

    #[test]
    fn sequence_random_cycles_and_wraps() {
        let random = SequenceRandom::new(vec![0, 5, 2]);
        assert_eq!(random.index(4), 0);
        assert_eq!(random.index(4), 1);
        assert_eq!(random.index(4), 2);
        assert_eq!(random.index(4), 0);
    }

    #[test]
    fn empty_sequence_returns_zero() {
        let random = SequenceRandom::new(vec![]);
        assert_eq!(random.index(3), 0);
    }

    #[test]
    fn choose_handles_empty_slice() {
        let items: [u8; 0] = [];
        assert!(choose(&ThreadRandom, &items).is_none());
        assert_eq!(choose(&SequenceRandom::fixed(1), &["a", "b"]), Some(&"b"));
    }
}
