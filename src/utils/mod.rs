//! Utility modules

pub mod error;

pub use error::{BenchmarkError, DatasetError, EngineError, Result};
