//! Sizing and probability math for Bloom filters

use std::f64::consts::LN_2;

use crate::{BloomError, Result};

/// Largest number of bits a filter can address (`2^32 - 1`)
pub const MAX_BIT_COUNT: u64 = u32::MAX as u64;

/// Shape of a Bloom filter: total bits and hashes per element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParameters {
    pub bit_count: u32,
    pub hash_count: usize,
}

impl FilterParameters {
    /// Optimal parameters for `capacity` elements at false-positive rate `p`.
    ///
    /// `m = ceil(-n * ln(p) / ln(2)^2)`, `k = round((m / n) * ln(2))`, both
    /// at least 1.
    pub fn from_probability(capacity: u32, false_positive_probability: f64) -> Result<Self> {
        let bits = optimal_bit_count(capacity, false_positive_probability)?;
        let bit_count = checked_bit_count(bits)?;
        let hash_count = optimal_hash_count(bit_count as u64, capacity);

        Ok(FilterParameters {
            bit_count,
            hash_count,
        })
    }

    /// Parameters for `capacity` elements with a fixed bit budget per element.
    /// The hash count is the optimum `round(bits_per_element * ln(2))`.
    pub fn from_bits_per_element(capacity: u32, bits_per_element: u32) -> Result<Self> {
        require_capacity(capacity)?;
        let bit_count = checked_bit_count(capacity as u64 * bits_per_element as u64)?;
        let hash_count = optimal_hash_count(bit_count as u64, capacity);

        Ok(FilterParameters {
            bit_count,
            hash_count,
        })
    }

    /// Expected false-positive probability after `elements` insertions
    pub fn expected_fpr(&self, elements: u64) -> f64 {
        false_positive_probability(self.bit_count, self.hash_count, elements)
    }
}

fn require_capacity(capacity: u32) -> Result<()> {
    if capacity == 0 {
        return Err(BloomError::InvalidArgument(
            "Capacity must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Optimal number of bits: `m = ceil(-n * ln(p) / ln(2)^2)`, at least 1.
///
/// Not range checked against [`MAX_BIT_COUNT`]; see [`checked_bit_count`].
pub fn optimal_bit_count(capacity: u32, false_positive_probability: f64) -> Result<u64> {
    require_capacity(capacity)?;
    let p = false_positive_probability;
    if !(p > 0.0 && p <= 1.0) {
        return Err(BloomError::InvalidArgument(format!(
            "Probability must be in range (0, 1], got {}",
            p
        )));
    }

    let ln2_squared = LN_2 * LN_2;
    let bits = (-(capacity as f64) * p.ln() / ln2_squared).ceil();
    // float to int casts saturate, oversized results surface as CapacityExceeded
    Ok((bits as u64).max(1))
}

/// Optimal number of hash functions: `k = round((m / n) * ln(2))`, at least 1
pub fn optimal_hash_count(bit_count: u64, capacity: u32) -> usize {
    if capacity == 0 {
        return 1;
    }
    let k = ((bit_count as f64 / capacity as f64) * LN_2).round() as usize;
    k.max(1)
}

/// Validate a total bit count: zero is rejected, and so is anything above
/// [`MAX_BIT_COUNT`].
pub fn checked_bit_count(total_bits: u64) -> Result<u32> {
    if total_bits == 0 {
        return Err(BloomError::InvalidArgument(
            "Bit count must be > 0".to_string(),
        ));
    }
    u32::try_from(total_bits).map_err(|_| BloomError::CapacityExceeded {
        requested: total_bits,
    })
}

/// False-positive probability of a filter with `bit_count` bits and
/// `hash_count` hashes holding `elements` items:
/// `(1 - (1 - 1/m)^(k*n))^k`
pub fn false_positive_probability(bit_count: u32, hash_count: usize, elements: u64) -> f64 {
    let m = bit_count as f64;
    let k = hash_count as f64;
    let n = elements as f64;
    (1.0 - (1.0 - 1.0 / m).powf(k * n)).powf(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_from_probability() {
        let params = FilterParameters::from_probability(100, 0.1).unwrap();
        assert_eq!(params.bit_count, 480);
        assert_eq!(params.hash_count, 3);

        let params = FilterParameters::from_probability(1000, 0.01).unwrap();
        assert_eq!(params.bit_count, 9586);
        assert_eq!(params.hash_count, 7);
    }

    #[test]
    fn test_parameters_match_closed_form() {
        let n = 100.0_f64;
        let p = 0.1_f64;
        let m = (-n * p.ln() / (LN_2 * LN_2)).ceil();
        let k = ((m / n) * LN_2).round();

        let params = FilterParameters::from_probability(100, 0.1).unwrap();
        assert_eq!(params.bit_count as f64, m);
        assert_eq!(params.hash_count as f64, k);
    }

    #[test]
    fn test_probability_one_is_minimal() {
        let params = FilterParameters::from_probability(10, 1.0).unwrap();
        assert_eq!(params.bit_count, 1);
        assert_eq!(params.hash_count, 1);
    }

    #[test]
    fn test_invalid_probability() {
        for p in [0.0, -0.1, 1.5, f64::NAN] {
            assert!(matches!(
                FilterParameters::from_probability(100, p),
                Err(BloomError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_zero_capacity() {
        assert!(matches!(
            FilterParameters::from_probability(0, 0.1),
            Err(BloomError::InvalidArgument(_))
        ));
        assert!(matches!(
            FilterParameters::from_bits_per_element(0, 10),
            Err(BloomError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parameters_from_bits_per_element() {
        let params = FilterParameters::from_bits_per_element(1000, 10).unwrap();
        assert_eq!(params.bit_count, 10_000);
        assert_eq!(params.hash_count, 7);

        let params = FilterParameters::from_bits_per_element(1000, 8).unwrap();
        assert_eq!(params.hash_count, 6);

        let params = FilterParameters::from_bits_per_element(1000, 1).unwrap();
        assert_eq!(params.hash_count, 1);
    }

    #[test]
    fn test_checked_bit_count_boundary() {
        assert_eq!(checked_bit_count(MAX_BIT_COUNT).unwrap(), u32::MAX);
        assert!(matches!(
            checked_bit_count(MAX_BIT_COUNT + 1),
            Err(BloomError::CapacityExceeded { requested }) if requested == 1 << 32
        ));
        assert!(matches!(
            checked_bit_count(0),
            Err(BloomError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bits_per_element_overflow() {
        // 2^16 * 2^16 = 2^32 bits
        assert!(matches!(
            FilterParameters::from_bits_per_element(1 << 16, 1 << 16),
            Err(BloomError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_tiny_probability_exceeds_capacity() {
        assert!(matches!(
            FilterParameters::from_probability(u32::MAX, 1e-9),
            Err(BloomError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_false_positive_probability() {
        assert_eq!(false_positive_probability(480, 3, 0), 0.0);

        let fpr = false_positive_probability(480, 3, 100);
        assert!((fpr - 0.1006).abs() < 1e-3);

        let params = FilterParameters::from_probability(1000, 0.01).unwrap();
        let fpr = params.expected_fpr(1000);
        assert!(fpr > 0.0);
        assert!(fpr <= 0.011);
    }

    #[test]
    fn test_fpr_grows_with_elements() {
        let mut last = 0.0;
        for n in [1, 10, 100, 1000] {
            let fpr = false_positive_probability(480, 3, n);
            assert!(fpr > last);
            last = fpr;
        }
    }
}
