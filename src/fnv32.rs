//! 32-bit Fowler–Noll–Vo hash functions
//!
//! Public domain algorithm, see
//! <http://www.isthe.com/chongo/tech/comp/fnv/index.html#FNV-reference-source>.
//! Both variants are stateless and allocation free.

use crate::hash::HashFunction;

/// FNV prime for 32-bit operations
pub const FNV_PRIME_32: u32 = 16_777_619;

/// FNV offset basis for 32-bit operations
pub const FNV_OFFSET_32: u32 = 2_166_136_261;

/// FNV-1a: xor the byte in, then multiply by the prime.
#[inline]
pub fn fnv1a_32(data: &[u8]) -> u32 {
    let mut res = FNV_OFFSET_32;
    for &byte in data {
        res ^= byte as u32;
        res = res.wrapping_mul(FNV_PRIME_32);
    }
    res
}

/// FNV-1: multiply by the prime, then xor the byte in.
#[inline]
pub fn fnv32(data: &[u8]) -> u32 {
    let mut res = FNV_OFFSET_32;
    for &byte in data {
        res = res.wrapping_mul(FNV_PRIME_32);
        res ^= byte as u32;
    }
    res
}

/// FNV-1a as a [`HashFunction`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv1a32;

impl HashFunction for Fnv1a32 {
    #[inline]
    fn hash(&self, data: &[u8]) -> u32 {
        fnv1a_32(data)
    }

    fn name(&self) -> String {
        "fnv1a32".to_string()
    }
}

/// FNV-1 as a [`HashFunction`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv32;

impl HashFunction for Fnv32 {
    #[inline]
    fn hash(&self, data: &[u8]) -> u32 {
        fnv32(data)
    }

    fn name(&self) -> String {
        "fnv32".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_offset_basis() {
        assert_eq!(fnv1a_32(&[]), FNV_OFFSET_32);
        assert_eq!(fnv32(&[]), FNV_OFFSET_32);
    }

    #[test]
    fn test_reference_vectors() {
        // Published FNV test vectors
        assert_eq!(fnv1a_32(b"a"), 0xe40c292c);
        assert_eq!(fnv32(b"a"), 0x050c5d7e);

        assert_eq!(fnv1a_32(b"hello"), 0x4f9f2cab);
        assert_eq!(fnv32(b"hello"), 0xb6fa7167);
    }

    #[test]
    fn test_sub_range() {
        let data = b"xxhelloyy";
        assert_eq!(fnv1a_32(&data[2..7]), fnv1a_32(b"hello"));
    }

    #[test]
    fn test_hash_function_impls() {
        assert_eq!(Fnv1a32.hash(b"hello"), fnv1a_32(b"hello"));
        assert_eq!(Fnv32.hash(b"hello"), fnv32(b"hello"));
        assert_ne!(Fnv1a32.name(), Fnv32.name());
    }
}
