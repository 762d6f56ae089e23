//! Counting stand-in engine
//!
//! Used when the crate is built without the `ffi` feature: accepts every
//! operation, counts inserts and searches, returns no hits. Lets the loader
//! and harness run (and be benchmarked) without the engine library present.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::utils::EngineError;

use super::{SearchHit, SparseIndexEngine, TupleElement};

#[derive(Debug, Default)]
pub struct NullEngine {
    inserted: AtomicU64,
    searched: AtomicU64,
}

impl NullEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vectors accepted so far
    pub fn inserted(&self) -> u64 {
        self.inserted.load(Ordering::Relaxed)
    }

    /// Searches accepted so far
    pub fn searched(&self) -> u64 {
        self.searched.load(Ordering::Relaxed)
    }
}

impl SparseIndexEngine for NullEngine {
    fn create_index(&self, _parameter: &str) -> Result<(), EngineError> {
        Ok(())
    }

    fn insert(&self, _row_id: u32, _vector: &[TupleElement]) -> Result<(), EngineError> {
        self.inserted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn commit(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn load(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn search(
        &self,
        _vector: &[TupleElement],
        _filter: &[u8],
        _top_k: usize,
    ) -> Result<Vec<SearchHit>, EngineError> {
        self.searched.fetch_add(1, Ordering::Relaxed);
        Ok(Vec::new())
    }
}
