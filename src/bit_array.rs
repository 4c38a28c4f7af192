//! Lock-free bit array backed by 32-bit atomic words

use std::sync::atomic::{AtomicU32, Ordering};

/// Number of bits stored in each word
pub const BITS_PER_WORD: u32 = u32::BITS;

/// Fixed-size bit array that supports concurrent set/get without locks.
///
/// Bits can only ever be set. The array holds `bit_count / 32 + 1` words, one
/// more than strictly needed when `bit_count` is a multiple of 32.
pub struct AtomicBitArray {
    words: Box<[AtomicU32]>,
    bit_count: u32,
}

impl AtomicBitArray {
    /// Allocate a zeroed array addressing `bit_count` bits
    pub fn new(bit_count: u32) -> Self {
        let len = Self::words_for(bit_count);
        let words: Box<[AtomicU32]> = (0..len)
            .map(|_| AtomicU32::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        AtomicBitArray { words, bit_count }
    }

    /// Word count needed for `bit_count` bits, including the reserved word
    pub fn words_for(bit_count: u32) -> usize {
        (bit_count / BITS_PER_WORD) as usize + 1
    }

    #[inline]
    fn locate(index: u32) -> (usize, u32) {
        let word = (index / BITS_PER_WORD) as usize;
        let mask = 1u32 << (index % BITS_PER_WORD);
        (word, mask)
    }

    /// Set the bit at `index`.
    ///
    /// Compare-and-swap retry loop. A failed exchange means another thread
    /// changed the word, so the system as a whole always makes progress. When
    /// the bit is already set we return without writing.
    #[inline]
    pub fn set_bit(&self, index: u32) {
        debug_assert!(index < self.bit_count, "bit index out of range");
        let (word, mask) = Self::locate(index);
        let cell = &self.words[word];

        let mut current = cell.load(Ordering::Acquire);
        loop {
            if current & mask == mask {
                return;
            }
            match cell.compare_exchange_weak(
                current,
                current | mask,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// Test the bit at `index`.
    ///
    /// A single atomic load; a concurrent `set_bit` on another thread may not
    /// be visible yet.
    #[inline]
    pub fn get_bit(&self, index: u32) -> bool {
        debug_assert!(index < self.bit_count, "bit index out of range");
        let (word, mask) = Self::locate(index);
        self.words[word].load(Ordering::Acquire) & mask == mask
    }

    /// Number of addressable bits
    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    /// Number of backing words
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Number of set bits. Not a consistent snapshot under concurrent writes.
    pub fn count_ones(&self) -> u64 {
        self.words
            .iter()
            .map(|word| word.load(Ordering::Relaxed).count_ones() as u64)
            .sum()
    }

    /// Copy of the raw words
    pub fn snapshot(&self) -> Vec<u32> {
        self.words
            .iter()
            .map(|word| word.load(Ordering::Acquire))
            .collect()
    }
}

impl std::fmt::Debug for AtomicBitArray {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("AtomicBitArray")
            .field("bit_count", &self.bit_count)
            .field("words", &self.words.len())
            .field("set_bits", &self.count_ones())
            .finish()
    }
}
