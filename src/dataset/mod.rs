//! Streaming dataset loading
//!
//! Converts large newline-free JSON dataset files (one array of records per
//! file) into typed sparse-vector rows, one at a time, with memory usage
//! independent of file size. The pipeline is byte source -> event tokenizer
//! -> record builder, driven per iteration call by the loader facade.

pub mod builder;
pub mod chunk;
pub mod loader;
pub mod record;
pub mod tokenizer;

pub use builder::{RecordBuilder, RowLimit, Step};
pub use chunk::{ChunkedByteSource, DEFAULT_CHUNK_SIZE};
pub use loader::{DatasetConfig, DatasetLoader, RowReader};
pub use record::{ArrayField, QueryRow, RowShape, TrainingRow};
pub use tokenizer::{JsonEvent, JsonTokenizer};
