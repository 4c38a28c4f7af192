//! # Concurrent Bloom
//!
//! A lock-free concurrent Bloom filter. Elements are reduced to a 32-bit seed,
//! expanded into k bit positions through a rehash chain (FNV-1a by default) and
//! recorded in an atomic word array with compare-and-swap, so any number of
//! threads can add and query one shared filter without locks.
//!
//! ```
//! use concurrent_bloom::ConcurrentBloomFilter;
//!
//! let filter = ConcurrentBloomFilter::<str>::with_probability(100, 0.1)?;
//! filter.add("trueString");
//! assert!(filter.possibly_contains("trueString"));
//! # Ok::<(), concurrent_bloom::BloomError>(())
//! ```

pub mod bit_array;
pub mod bloom;
pub mod fnv32;
pub mod hash;
pub mod utils;

pub use bit_array::AtomicBitArray;
pub use bloom::{BloomStats, ConcurrentBloomFilter};
pub use fnv32::{fnv1a_32, fnv32, Fnv1a32, Fnv32};
pub use hash::{
    default_strategy, item_seed, DefaultKHash, HashFunction, KHashFunction, RehashKHash,
    Rehashable, Rehasher,
};
pub use utils::FilterParameters;

// Python bindings
#[cfg(feature = "python")]
pub mod python_module;

/// Common error types for the library
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BloomError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Capacity exceeded: {requested} bits requested, at most 2^32 - 1 supported")]
    CapacityExceeded { requested: u64 },
    #[error("Out of range: {requested} hashes requested, strategy supports at most {max}")]
    OutOfRange { requested: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, BloomError>;
