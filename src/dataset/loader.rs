//! Dataset loader facade
//!
//! Owns the configured file paths for the training and query datasets and,
//! per iteration call, wires byte source -> tokenizer -> builder and drives
//! the pipeline. Each call opens its own scoped file handle, so independent
//! calls may run concurrently on separate threads over separate files. The
//! handle is released on every exit path when the reader drops.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::utils::DatasetError;

use super::builder::{RecordBuilder, RowLimit, Step};
use super::chunk::ChunkedByteSource;
use super::record::{QueryRow, RowShape, TrainingRow};
use super::tokenizer::JsonTokenizer;

/// File paths for the two logical datasets
///
/// Built once, read-only afterwards; safe to share across threads by
/// reference while iteration calls run.
#[derive(Debug, Clone, Default)]
pub struct DatasetConfig {
    pub train_file: Option<PathBuf>,
    pub query_file: Option<PathBuf>,
}

impl DatasetConfig {
    pub fn new(train_file: impl Into<PathBuf>, query_file: impl Into<PathBuf>) -> Self {
        Self {
            train_file: Some(train_file.into()),
            query_file: Some(query_file.into()),
        }
    }
}

/// Pull-form reader over one dataset file
///
/// Each `next_row` call drives the tokenizer until a record closes, the row
/// limit trips, or the document ends. Memory stays bounded by one chunk plus
/// one in-flight record.
pub struct RowReader<T: RowShape, R> {
    tokenizer: JsonTokenizer<R>,
    builder: RecordBuilder<T>,
    stopped: bool,
}

impl<T: RowShape> RowReader<T, File> {
    /// Open a dataset file for row-at-a-time reading
    pub fn open<P: AsRef<Path>>(path: P, limit: RowLimit) -> Result<Self, DatasetError> {
        Ok(Self::new(ChunkedByteSource::open(path)?, limit))
    }
}

impl<T: RowShape, R: Read> RowReader<T, R> {
    pub fn new(source: ChunkedByteSource<R>, limit: RowLimit) -> Self {
        Self {
            tokenizer: JsonTokenizer::new(source),
            builder: RecordBuilder::new(limit),
            stopped: false,
        }
    }

    /// Rows delivered so far
    pub fn rows_read(&self) -> u64 {
        self.builder.completed()
    }

    /// Next completed record, or `None` after the document ends or the row
    /// limit is reached. A parse error is fatal: rows already returned stay
    /// valid, but no further rows follow.
    pub fn next_row(&mut self) -> Result<Option<T>, DatasetError> {
        if self.stopped {
            return Ok(None);
        }
        while let Some(event) = self.tokenizer.next_event()? {
            match self.builder.feed(event) {
                Step::Continue => {}
                Step::Emit(row) => return Ok(Some(row)),
                Step::Stop => {
                    self.stopped = true;
                    return Ok(None);
                }
            }
        }
        self.stopped = true;
        Ok(None)
    }
}

impl<T: RowShape, R: Read> Iterator for RowReader<T, R> {
    type Item = Result<T, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Facade over the two datasets
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    config: DatasetConfig,
}

impl DatasetLoader {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Stream training rows to `handler` in file order, stopping at end of
    /// file or `limit`. Returns the number of rows delivered. The handler is
    /// never invoked after this call returns.
    pub fn iterate_train_rows<F>(&self, handler: F, limit: RowLimit) -> Result<u64, DatasetError>
    where
        F: FnMut(TrainingRow),
    {
        let path = self
            .config
            .train_file
            .as_deref()
            .ok_or(DatasetError::NotConfigured)?;
        Self::iterate_rows(path, handler, limit)
    }

    /// Stream query rows to `handler` in file order, stopping at end of
    /// file or `limit`. Returns the number of rows delivered.
    pub fn iterate_query_rows<F>(&self, handler: F, limit: RowLimit) -> Result<u64, DatasetError>
    where
        F: FnMut(QueryRow),
    {
        let path = self
            .config
            .query_file
            .as_deref()
            .ok_or(DatasetError::NotConfigured)?;
        Self::iterate_rows(path, handler, limit)
    }

    fn iterate_rows<T, F>(path: &Path, mut handler: F, limit: RowLimit) -> Result<u64, DatasetError>
    where
        T: RowShape,
        F: FnMut(T),
    {
        debug!(path = %path.display(), "opening dataset file");
        let mut reader = RowReader::<T, File>::open(path, limit)?;
        while let Some(row) = reader.next_row()? {
            handler(row);
        }
        debug!(rows = reader.rows_read(), "dataset iteration finished");
        Ok(reader.rows_read())
    }
}
