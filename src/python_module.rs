//! Python bindings for concurrent-bloom using PyO3

use crate::bloom::ConcurrentBloomFilter;
use crate::hash::item_seed;
use crate::utils::MAX_BIT_COUNT;
use numpy::{IntoPyArray, PyArray1};
use pyo3::prelude::*;

fn to_py_err(e: crate::BloomError) -> PyErr {
    PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string())
}

/// Python wrapper for ConcurrentBloomFilter over strings
#[pyclass(name = "ConcurrentBloomFilter")]
struct PyConcurrentBloomFilter {
    inner: ConcurrentBloomFilter<str>,
}

#[pymethods]
impl PyConcurrentBloomFilter {
    #[new]
    #[pyo3(signature = (capacity, false_positive_probability = 0.01))]
    fn new(capacity: u32, false_positive_probability: f64) -> PyResult<Self> {
        let filter = ConcurrentBloomFilter::with_probability(capacity, false_positive_probability)
            .map_err(to_py_err)?;
        Ok(PyConcurrentBloomFilter { inner: filter })
    }

    /// Build with a fixed bit budget per element and an optional hash count
    #[staticmethod]
    #[pyo3(signature = (capacity, bits_per_element, hash_count = None))]
    fn with_bits_per_element(
        capacity: u32,
        bits_per_element: u32,
        hash_count: Option<usize>,
    ) -> PyResult<Self> {
        let filter = match hash_count {
            Some(k) => ConcurrentBloomFilter::with_hash_count(capacity, bits_per_element, k),
            None => ConcurrentBloomFilter::with_bits_per_element(capacity, bits_per_element),
        }
        .map_err(to_py_err)?;
        Ok(PyConcurrentBloomFilter { inner: filter })
    }

    fn add(&self, item: &str) {
        self.inner.add(item);
    }

    /// Insert a batch without holding the GIL
    fn add_many(&self, py: Python<'_>, items: Vec<String>) {
        let inner = &self.inner;
        py.allow_threads(|| {
            for item in &items {
                inner.add(item.as_str());
            }
        });
    }

    fn add_seed(&self, seed: u32) {
        self.inner.add_seed(seed);
    }

    fn possibly_contains(&self, item: &str) -> bool {
        self.inner.possibly_contains(item)
    }

    fn possibly_contains_seed(&self, seed: u32) -> bool {
        self.inner.possibly_contains_seed(seed)
    }

    fn __contains__(&self, item: &str) -> bool {
        self.inner.possibly_contains(item)
    }

    #[getter]
    fn bit_count(&self) -> u32 {
        self.inner.bit_count()
    }

    #[getter]
    fn hash_count(&self) -> usize {
        self.inner.hash_count()
    }

    #[getter]
    fn element_count(&self) -> u64 {
        self.inner.element_count()
    }

    #[getter]
    fn error_probability(&self) -> f64 {
        self.inner.error_probability()
    }

    fn load_factor(&self) -> f64 {
        self.inner.load_factor()
    }

    fn words<'py>(&self, py: Python<'py>) -> &'py PyArray1<u32> {
        self.inner.words().into_pyarray(py)
    }

    fn mem_bytes(&self) -> usize {
        self.inner.word_count() * 4
    }

    fn backend(&self) -> &str {
        "rust"
    }

    fn stats(&self) -> String {
        self.inner.stats().to_string()
    }

    fn __len__(&self) -> usize {
        self.inner.element_count() as usize
    }

    fn __str__(&self) -> String {
        format!(
            "ConcurrentBloomFilter(bits={}, hashes={}, elements={}, error={:.6})",
            self.inner.bit_count(),
            self.inner.hash_count(),
            self.inner.element_count(),
            self.inner.error_probability()
        )
    }

    fn __repr__(&self) -> String {
        format!(
            "ConcurrentBloomFilter(bits={}, elements={})",
            self.inner.bit_count(),
            self.inner.element_count()
        )
    }
}

/// The 32-bit seed the filter derives for a string
#[pyfunction]
fn seed_of(item: &str) -> u32 {
    item_seed(item)
}

/// Python module definition
#[pymodule]
fn concurrent_bloom(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyConcurrentBloomFilter>()?;

    m.add_function(wrap_pyfunction!(seed_of, m)?)?;

    // Add module constants
    m.add("MAX_BIT_COUNT", MAX_BIT_COUNT)?;
    m.add("__version__", "0.1.0")?;

    Ok(())
}
