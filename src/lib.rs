//! sparse-search-benchmark library
//!
//! Benchmark tool for an external sparse-index engine: streams MS MARCO
//! style sparse-vector datasets in constant memory and feeds rows across
//! the engine boundary for indexing and top-k search.

pub mod benchmark;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod utils;
