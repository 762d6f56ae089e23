//! Raw C ABI declarations for the sparse-index engine plus a thin safe
//! wrapper. Only compiled with the `ffi` feature, which requires the engine
//! library on the link path.

use std::ffi::CString;
use std::os::raw::c_char;

use crate::utils::EngineError;

use super::{SearchHit, SparseIndexEngine, TupleElement};

extern "C" {
    fn sparse_index_create_index_with_parameter(
        index_path: *const c_char,
        parameter: *const c_char,
    ) -> bool;

    fn sparse_index_insert_sparse_vector(
        index_path: *const c_char,
        row_id: u32,
        elements: *const TupleElement,
        elements_len: usize,
    ) -> bool;

    fn sparse_index_commit_index(index_path: *const c_char) -> bool;

    fn sparse_index_load_index(index_path: *const c_char) -> bool;

    fn sparse_index_search(
        index_path: *const c_char,
        elements: *const TupleElement,
        elements_len: usize,
        filter: *const u8,
        filter_len: usize,
        top_k: usize,
        out_hits: *mut SearchHit,
        out_len: *mut usize,
    ) -> bool;
}

/// Engine handle bound to one index directory
pub struct FfiEngine {
    index_path: CString,
}

impl FfiEngine {
    pub fn new(index_path: &str) -> Result<Self, EngineError> {
        let index_path = CString::new(index_path)
            .map_err(|_| EngineError::Index("index path contains a NUL byte".to_string()))?;
        Ok(Self { index_path })
    }
}

impl SparseIndexEngine for FfiEngine {
    fn create_index(&self, parameter: &str) -> Result<(), EngineError> {
        let parameter = CString::new(parameter)
            .map_err(|_| EngineError::Index("parameter contains a NUL byte".to_string()))?;
        // SAFETY: both pointers are valid NUL-terminated strings for the call
        let ok = unsafe {
            sparse_index_create_index_with_parameter(self.index_path.as_ptr(), parameter.as_ptr())
        };
        if ok {
            Ok(())
        } else {
            Err(EngineError::Index("create_index failed".to_string()))
        }
    }

    fn insert(&self, row_id: u32, vector: &[TupleElement]) -> Result<(), EngineError> {
        // SAFETY: the slice pointer/length pair stays valid for the call
        let ok = unsafe {
            sparse_index_insert_sparse_vector(
                self.index_path.as_ptr(),
                row_id,
                vector.as_ptr(),
                vector.len(),
            )
        };
        if ok {
            Ok(())
        } else {
            Err(EngineError::Index(format!("insert failed for row {row_id}")))
        }
    }

    fn commit(&self) -> Result<(), EngineError> {
        // SAFETY: index_path is a valid NUL-terminated string
        let ok = unsafe { sparse_index_commit_index(self.index_path.as_ptr()) };
        if ok {
            Ok(())
        } else {
            Err(EngineError::Index("commit failed".to_string()))
        }
    }

    fn load(&self) -> Result<(), EngineError> {
        // SAFETY: index_path is a valid NUL-terminated string
        let ok = unsafe { sparse_index_load_index(self.index_path.as_ptr()) };
        if ok {
            Ok(())
        } else {
            Err(EngineError::Index("load failed".to_string()))
        }
    }

    fn search(
        &self,
        vector: &[TupleElement],
        filter: &[u8],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, EngineError> {
        let mut hits = vec![SearchHit { row_id: 0, score: 0.0 }; top_k];
        let mut hits_len = 0usize;
        // SAFETY: out buffer holds top_k elements; the engine writes at most
        // top_k hits and reports the count through out_len
        let ok = unsafe {
            sparse_index_search(
                self.index_path.as_ptr(),
                vector.as_ptr(),
                vector.len(),
                filter.as_ptr(),
                filter.len(),
                top_k,
                hits.as_mut_ptr(),
                &mut hits_len,
            )
        };
        if !ok {
            return Err(EngineError::Search("search returned an error flag".to_string()));
        }
        hits.truncate(hits_len.min(top_k));
        Ok(hits)
    }
}
