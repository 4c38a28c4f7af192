//! Concurrent Bloom filter implementation
//!
//! A space-efficient probabilistic data structure for membership testing that
//! can be shared between threads without locks. Every element is reduced to a
//! 32-bit seed, the seed is expanded into k positions by a [`KHashFunction`],
//! and those positions are set in an [`AtomicBitArray`].

use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::bit_array::AtomicBitArray;
use crate::hash::{default_strategy, item_seed, KHashFunction};
use crate::utils::{checked_bit_count, false_positive_probability, FilterParameters};
use crate::{BloomError, Result};

/// Hash counts up to this size are computed in a stack buffer
const INLINE_HASHES: usize = 16;

/// A lock-free concurrent Bloom filter over items of type `T`
///
/// `add` and `possibly_contains` take `&self`, so a filter can be shared
/// through an `Arc` or scoped threads. The shape (bit count and hash count)
/// is fixed at construction and bits are never cleared.
///
/// The element counter is bumped after the bits are set, as a separate atomic
/// step. Under concurrent inserts [`error_probability`](Self::error_probability)
/// may therefore be computed against a count that lags or leads the bits
/// actually set. It is an estimate either way.
pub struct ConcurrentBloomFilter<T: ?Sized> {
    /// Bit array storing the filter data
    bits: AtomicBitArray,
    /// Number of positions touched per element
    hash_count: usize,
    /// Number of `add` calls (approximate while inserts are in flight)
    element_count: AtomicU64,
    /// Strategy deriving the k positional hashes
    strategy: Arc<dyn KHashFunction>,
    _item: PhantomData<fn(&T)>,
}

impl<T: ?Sized> ConcurrentBloomFilter<T> {
    /// Create a filter sized for `capacity` elements at the desired
    /// false-positive probability, hashing with the default strategy.
    ///
    /// Fails with [`BloomError::InvalidArgument`] unless the probability lies
    /// in `(0, 1]`.
    pub fn with_probability(capacity: u32, false_positive_probability: f64) -> Result<Self> {
        let params = FilterParameters::from_probability(capacity, false_positive_probability)?;
        Self::from_parameters(params)
    }

    /// Create a filter with `capacity * bits_per_element` bits and the
    /// optimal hash count for that ratio.
    pub fn with_bits_per_element(capacity: u32, bits_per_element: u32) -> Result<Self> {
        let params = FilterParameters::from_bits_per_element(capacity, bits_per_element)?;
        Self::from_parameters(params)
    }

    /// Create a filter with `capacity * bits_per_element` bits and an explicit
    /// hash count, hashing with the default strategy.
    pub fn with_hash_count(
        capacity: u32,
        bits_per_element: u32,
        hash_count: usize,
    ) -> Result<Self> {
        let total_bits = capacity as u64 * bits_per_element as u64;
        Self::with_strategy(total_bits, None, hash_count)
    }

    /// Create a filter from precomputed parameters
    pub fn from_parameters(params: FilterParameters) -> Result<Self> {
        Self::with_strategy(params.bit_count as u64, None, params.hash_count)
    }

    /// Create a filter with exactly `bit_count` bits.
    ///
    /// A `None` strategy falls back to [`default_strategy`] (FNV-1a in the
    /// rehash adapter). Fails with [`BloomError::OutOfRange`] when
    /// `hash_count` exceeds the strategy's maximum and with
    /// [`BloomError::CapacityExceeded`] when `bit_count` exceeds `2^32 - 1`.
    /// The bit array is allocated up front.
    pub fn with_strategy(
        bit_count: u64,
        strategy: Option<Arc<dyn KHashFunction>>,
        hash_count: usize,
    ) -> Result<Self> {
        let strategy = match strategy {
            Some(strategy) => strategy,
            None => {
                debug!("no hash strategy supplied, using default");
                default_strategy()
            }
        };

        if hash_count == 0 {
            return Err(BloomError::InvalidArgument(
                "Number of hashes must be > 0".to_string(),
            ));
        }
        if hash_count > strategy.max_hashes() {
            return Err(BloomError::OutOfRange {
                requested: hash_count,
                max: strategy.max_hashes(),
            });
        }
        let bit_count = checked_bit_count(bit_count)?;

        let bits = AtomicBitArray::new(bit_count);
        debug!(
            bit_count,
            hash_count,
            words = bits.word_count(),
            strategy = %strategy.name(),
            "created concurrent bloom filter"
        );

        Ok(ConcurrentBloomFilter {
            bits,
            hash_count,
            element_count: AtomicU64::new(0),
            strategy,
            _item: PhantomData,
        })
    }

    /// Insert an element identified by a caller-supplied seed.
    ///
    /// Use this when items carry their own stable identity; seeds that
    /// collide are indistinguishable to the filter.
    pub fn add_seed(&self, seed: u32) {
        self.probe(seed, |position| {
            self.bits.set_bit(position);
            true
        });

        self.element_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Check an element identified by a caller-supplied seed
    pub fn possibly_contains_seed(&self, seed: u32) -> bool {
        self.probe(seed, |position| self.bits.get_bit(position))
    }

    /// Derive the k positions for `seed` and hand them to `visit` until it
    /// returns false. Returns whether every position was visited.
    #[inline]
    fn probe<F>(&self, seed: u32, mut visit: F) -> bool
    where
        F: FnMut(u32) -> bool,
    {
        let work = seed.to_le_bytes();

        let mut inline = [0u32; INLINE_HASHES];
        let mut spill;
        let hashes: &mut [u32] = if self.hash_count <= INLINE_HASHES {
            &mut inline[..self.hash_count]
        } else {
            spill = vec![0u32; self.hash_count];
            &mut spill[..]
        };

        // hash_count <= max_hashes was checked at construction
        self.strategy.fill(&work, hashes);

        let bit_count = self.bits.bit_count();
        hashes.iter().all(|&hash| visit(hash % bit_count))
    }

    /// Total bits used by this filter
    pub fn bit_count(&self) -> u32 {
        self.bits.bit_count()
    }

    /// Number of hashes per element
    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// Number of elements added. Approximate while adds are in flight.
    pub fn element_count(&self) -> u64 {
        self.element_count.load(Ordering::Relaxed)
    }

    /// True when nothing has been added yet
    pub fn is_empty(&self) -> bool {
        self.element_count() == 0
    }

    /// Number of backing 32-bit words
    pub fn word_count(&self) -> usize {
        self.bits.word_count()
    }

    /// Name of the hash strategy in use
    pub fn strategy_name(&self) -> String {
        self.strategy.name()
    }

    /// Probability that `possibly_contains` returns a false positive, from
    /// the current element count: `(1 - (1 - 1/m)^(k*n))^k`.
    pub fn error_probability(&self) -> f64 {
        false_positive_probability(self.bit_count(), self.hash_count, self.element_count())
    }

    /// Fraction of bits set
    pub fn load_factor(&self) -> f64 {
        self.bits.count_ones() as f64 / self.bit_count() as f64
    }

    /// False-positive estimate from the observed fill: `load_factor^k`
    pub fn estimated_fpr(&self) -> f64 {
        self.load_factor().powi(self.hash_count as i32)
    }

    /// Copy of the raw bit words
    pub fn words(&self) -> Vec<u32> {
        self.bits.snapshot()
    }

    /// Get statistics about the filter
    pub fn stats(&self) -> BloomStats {
        BloomStats {
            bit_count: self.bit_count(),
            hash_count: self.hash_count,
            elements_inserted: self.element_count(),
            set_bits: self.bits.count_ones(),
            load_factor: self.load_factor(),
            error_probability: self.error_probability(),
            estimated_fpr: self.estimated_fpr(),
        }
    }
}

impl<T: Hash + ?Sized> ConcurrentBloomFilter<T> {
    /// Insert an item, seeded through [`item_seed`]
    pub fn add(&self, item: &T) {
        self.add_seed(item_seed(item));
    }

    /// Returns true if the item might be present (with possible false
    /// positives), false if it is definitely absent.
    ///
    /// Items added earlier on this thread, or on another thread whose add
    /// happens-before this call, are always reported present.
    pub fn possibly_contains(&self, item: &T) -> bool {
        self.possibly_contains_seed(item_seed(item))
    }
}

impl<T: ?Sized> std::fmt::Debug for ConcurrentBloomFilter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("ConcurrentBloomFilter")
            .field("bit_count", &self.bit_count())
            .field("hash_count", &self.hash_count)
            .field("element_count", &self.element_count())
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

/// Statistics about a concurrent Bloom filter
#[derive(Debug, Clone)]
pub struct BloomStats {
    pub bit_count: u32,
    pub hash_count: usize,
    pub elements_inserted: u64,
    pub set_bits: u64,
    pub load_factor: f64,
    pub error_probability: f64,
    pub estimated_fpr: f64,
}

impl std::fmt::Display for BloomStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ConcurrentBloomFilter Stats:\n\
             - Bits: {}\n\
             - Hash functions: {}\n\
             - Elements inserted: {}\n\
             - Bits set: {}\n\
             - Load factor: {:.3}\n\
             - Error probability: {:.6}\n\
             - Estimated FPR (fill): {:.6}",
            self.bit_count,
            self.hash_count,
            self.elements_inserted,
            self.set_bits,
            self.load_factor,
            self.error_probability,
            self.estimated_fpr
        )
    }
}
