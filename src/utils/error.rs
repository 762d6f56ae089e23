//! Error types for sparse-search-benchmark

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Dataset-related errors
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to open dataset {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Malformed JSON at byte offset {offset}: {message}")]
    Parse { offset: u64, message: String },

    #[error("Dataset file path not configured")]
    NotConfigured,

    #[error("IO error while reading dataset: {0}")]
    Io(#[from] io::Error),
}

/// Errors crossing the sparse-index engine boundary
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Index operation failed: {0}")]
    Index(String),

    #[error("Search failed: {0}")]
    Search(String),
}

pub type Result<T> = std::result::Result<T, BenchmarkError>;
