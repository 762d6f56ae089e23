//! Boundary to the external sparse-index engine
//!
//! The engine itself lives in a separate library reached over a C ABI; this
//! module only declares the contract the benchmark needs: create, insert,
//! commit, load, search. The `ffi` feature links the real engine; without it
//! the in-process [`NullEngine`] stands in so the loader and harness can run
//! anywhere.

pub mod null;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use null::NullEngine;

#[cfg(feature = "ffi")]
pub use ffi::FfiEngine;

use crate::utils::EngineError;

/// One nonzero term of a sparse vector in the engine's wire layout
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TupleElement {
    pub dim_id: u32,
    pub weight: f32,
    /// Reserved by the engine ABI; always zero here
    pub reserved_a: u32,
    pub reserved_b: u32,
    pub reserved_c: u32,
}

impl TupleElement {
    pub fn new(dim_id: u32, weight: f32) -> Self {
        Self {
            dim_id,
            weight,
            reserved_a: 0,
            reserved_b: 0,
            reserved_c: 0,
        }
    }
}

/// A single search result
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub row_id: u64,
    pub score: f32,
}

/// Operations the benchmark needs from the index engine
pub trait SparseIndexEngine {
    /// Create (or recreate) the index with an engine parameter blob
    fn create_index(&self, parameter: &str) -> Result<(), EngineError>;

    /// Insert one sparse vector under `row_id`
    fn insert(&self, row_id: u32, vector: &[TupleElement]) -> Result<(), EngineError>;

    /// Make inserted vectors durable and searchable
    fn commit(&self) -> Result<(), EngineError>;

    /// Load the committed index for searching
    fn load(&self) -> Result<(), EngineError>;

    /// Top-k search; hits come back ordered by descending score
    fn search(
        &self,
        vector: &[TupleElement],
        filter: &[u8],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, EngineError>;
}

/// Zip a record's parallel arrays into engine tuples, pairing up to the
/// shorter of the two
pub fn to_tuples(dim_ids: &[u32], weights: &[f32]) -> Vec<TupleElement> {
    dim_ids
        .iter()
        .zip(weights)
        .map(|(&dim_id, &weight)| TupleElement::new(dim_id, weight))
        .collect()
}
