//! Transaction number sequence

use serde::{Deserialize, Serialize};

/// Monotonic source of transaction numbers
///
/// Seeded once per run (usually from a [`SequenceStore`](crate::SequenceStore))
/// and handed back at the end so the high-water mark can be persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSequence {
    next: u64,
}

impl TransactionSequence {
    pub fn new(seed: u64) -> Self {
        Self { next: seed }
    }

    /// Take the next number
    pub fn next_number(&mut self) -> u64 {
        let number = self.next;
        self.next += 1;
        number
    }

    /// The next number that would be handed out
    pub fn high_water_mark(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_are_strictly_increasing() {
        let mut sequence = TransactionSequence::new(40);
        let numbers: Vec<u64> = (0..5).map(|_| sequence.next_number()).collect();
        assert_eq!(numbers, vec![40, 41, 42, 43, 44]);
        assert_eq!(sequence.high_water_mark(), 45);
    }

    #[test]
    fn test_default_starts_at_zero() {
        let mut sequence = TransactionSequence::default();
        assert_eq!(sequence.next_number(), 0);
    }
}
