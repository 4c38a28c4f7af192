//! Hash functions for Bloom filters
//!
//! A filter needs k bit positions per element. Instead of k unrelated hash
//! functions, a single rehashable base hash is chained: the first value hashes
//! the input bytes and every following value hashes the little-endian bytes of
//! its predecessor. The values are correlated, which is the usual trade-off
//! double/triple hashing schemes make as well.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use fnv::FnvHasher;

use crate::fnv32::Fnv1a32;
use crate::{BloomError, Result};

/// Trait for single-shot 32-bit hash functions over a byte range
///
/// Implementations must be stateless (or internally synchronized) since a
/// single instance is shared by every thread using a filter.
pub trait HashFunction: Send + Sync {
    /// Hash the given bytes. Sub-ranges are expressed by slicing.
    fn hash(&self, data: &[u8]) -> u32;

    /// Get a name/identifier for this hash function
    fn name(&self) -> String;
}

/// A hash function that can derive a new hash from a previous one
pub trait Rehasher: HashFunction {
    fn rehash(&self, previous: u32) -> u32;
}

/// Makes any [`HashFunction`] rehashable by hashing the 4-byte little-endian
/// representation of the previous value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rehashable<H> {
    inner: H,
}

impl<H: HashFunction> Rehashable<H> {
    pub fn new(inner: H) -> Self {
        Rehashable { inner }
    }

    /// The wrapped base hash
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: HashFunction> HashFunction for Rehashable<H> {
    #[inline]
    fn hash(&self, data: &[u8]) -> u32 {
        self.inner.hash(data)
    }

    fn name(&self) -> String {
        format!("rehash-{}", self.inner.name())
    }
}

impl<H: HashFunction> Rehasher for Rehashable<H> {
    #[inline]
    fn rehash(&self, previous: u32) -> u32 {
        // Scratch lives on the caller's stack, never shared between threads
        let work = previous.to_le_bytes();
        self.inner.hash(&work)
    }
}

/// A hash strategy producing k different hashes for a single element
///
/// [`fill`](KHashFunction::fill) is the hot path and cannot fail: a filter
/// checks its hash count against [`max_hashes`](KHashFunction::max_hashes)
/// once, at construction, and never again.
pub trait KHashFunction: Send + Sync {
    /// Fill `out` with `out.len()` hashes of `data`.
    ///
    /// Callers keep `out.len() <= max_hashes()`; implementations may assume it.
    fn fill(&self, data: &[u8], out: &mut [u32]);

    /// Maximum number of hashes this strategy can derive per element
    fn max_hashes(&self) -> usize;

    /// Get a name/identifier for this strategy
    fn name(&self) -> String;

    /// Checked [`fill`](KHashFunction::fill). Fails with
    /// [`BloomError::OutOfRange`] when more hashes are requested than
    /// [`max_hashes`](KHashFunction::max_hashes) allows.
    fn hash_into(&self, data: &[u8], out: &mut [u32]) -> Result<()> {
        if out.len() > self.max_hashes() {
            return Err(BloomError::OutOfRange {
                requested: out.len(),
                max: self.max_hashes(),
            });
        }
        self.fill(data, out);
        Ok(())
    }

    /// Allocating convenience over [`hash_into`](KHashFunction::hash_into)
    fn hash_k(&self, data: &[u8], k: usize) -> Result<Vec<u32>> {
        let mut out = vec![0u32; k];
        self.hash_into(data, &mut out)?;
        Ok(out)
    }
}

/// K-hash generator built on a rehash chain:
/// `h[0] = hash(data)`, `h[i] = rehash(h[i - 1])`.
#[derive(Debug, Clone)]
pub struct RehashKHash<R> {
    base: R,
    max_hashes: usize,
}

impl<R: Rehasher> RehashKHash<R> {
    /// A chain can be extended indefinitely, so the limit is `usize::MAX`
    pub fn new(base: R) -> Self {
        RehashKHash {
            base,
            max_hashes: usize::MAX,
        }
    }

    /// Create a generator that refuses to derive more than `max_hashes` values
    pub fn with_limit(base: R, max_hashes: usize) -> Self {
        RehashKHash { base, max_hashes }
    }

    pub fn base(&self) -> &R {
        &self.base
    }
}

impl<R: Rehasher> KHashFunction for RehashKHash<R> {
    fn fill(&self, data: &[u8], out: &mut [u32]) {
        let mut previous: Option<u32> = None;
        for slot in out.iter_mut() {
            let current = match previous {
                None => self.base.hash(data),
                Some(prev) => self.base.rehash(prev),
            };
            *slot = current;
            previous = Some(current);
        }
    }

    fn max_hashes(&self) -> usize {
        self.max_hashes
    }

    fn name(&self) -> String {
        format!("k-{}", self.base.name())
    }
}

/// The strategy used when none is supplied: FNV-1a in the rehash adapter
pub type DefaultKHash = RehashKHash<Rehashable<Fnv1a32>>;

/// Shared instance of [`DefaultKHash`]
pub fn default_strategy() -> Arc<dyn KHashFunction> {
    Arc::new(DefaultKHash::new(Rehashable::new(Fnv1a32)))
}

/// Derive the 32-bit seed a filter hashes for `item`.
///
/// The item is fed through 64-bit FNV-1a ([`FnvHasher`]) and folded to 32 bits.
/// Unlike `std`'s `RandomState` this is stable across processes, but it is
/// only as good as the item's `Hash` impl: items whose seeds collide share all
/// k bit positions, so seed quality bounds the real false-positive rate.
pub fn item_seed<T: Hash + ?Sized>(item: &T) -> u32 {
    let mut hasher = FnvHasher::default();
    item.hash(&mut hasher);
    let wide = hasher.finish();
    ((wide >> 32) as u32) ^ (wide as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fnv32::{fnv1a_32, Fnv32};

    #[test]
    fn test_rehash_uses_little_endian_bytes() {
        let hasher = Rehashable::new(Fnv1a32);
        let previous = 0x4f9f2cab_u32;
        assert_eq!(
            hasher.rehash(previous),
            fnv1a_32(&[0xab, 0x2c, 0x9f, 0x4f])
        );
    }

    #[test]
    fn test_rehash_chain_values() {
        let strategy = RehashKHash::new(Rehashable::new(Fnv1a32));
        let hashes = strategy.hash_k(b"hello", 3).unwrap();

        assert_eq!(hashes, vec![0x4f9f2cab, 0xb84c8688, 0x41869f5f]);
        assert_eq!(hashes[1], strategy.base().rehash(hashes[0]));
        assert_eq!(hashes[2], strategy.base().rehash(hashes[1]));
    }

    #[test]
    fn test_rehash_chain_fnv1() {
        let strategy = RehashKHash::new(Rehashable::new(Fnv32));
        let hashes = strategy.hash_k(b"hello", 3).unwrap();
        assert_eq!(hashes, vec![0xb6fa7167, 0xb5055e45, 0x9c64defa]);
    }

    #[test]
    fn test_k_hash_deterministic() {
        let strategy = default_strategy();
        let first = strategy.hash_k(b"deterministic", 8).unwrap();
        let second = strategy.hash_k(b"deterministic", 8).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_default_strategy_matches_alias() {
        let alias = DefaultKHash::new(Rehashable::new(Fnv1a32));
        let shared = default_strategy();
        assert_eq!(alias.name(), shared.name());
        assert_eq!(
            alias.hash_k(b"hello", 3).unwrap(),
            shared.hash_k(b"hello", 3).unwrap()
        );
    }

    #[test]
    fn test_fill_matches_checked_path() {
        let strategy = default_strategy();
        let mut out = [0u32; 3];
        strategy.fill(b"hello", &mut out);
        assert_eq!(out, [0x4f9f2cab, 0xb84c8688, 0x41869f5f]);
    }

    #[test]
    fn test_k_hash_limit() {
        let strategy = RehashKHash::with_limit(Rehashable::new(Fnv1a32), 4);
        assert_eq!(strategy.max_hashes(), 4);
        assert!(strategy.hash_k(b"x", 4).is_ok());

        match strategy.hash_k(b"x", 5) {
            Err(BloomError::OutOfRange { requested, max }) => {
                assert_eq!(requested, 5);
                assert_eq!(max, 4);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_hashes() {
        let strategy = default_strategy();
        assert!(strategy.hash_k(b"x", 0).unwrap().is_empty());
    }

    #[test]
    fn test_default_strategy_is_unbounded() {
        let strategy = default_strategy();
        assert_eq!(strategy.max_hashes(), usize::MAX);
        assert_eq!(strategy.name(), "k-rehash-fnv1a32");
    }

    #[test]
    fn test_item_seed() {
        assert_eq!(item_seed("trueString"), item_seed("trueString"));
        assert_eq!(item_seed("trueString"), item_seed(&"trueString".to_string()));
        assert_ne!(item_seed("trueString"), item_seed("falseString"));
        assert_ne!(item_seed(&1u64), item_seed(&2u64));
    }
}
