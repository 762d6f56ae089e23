//! Chunked byte source
//!
//! Pull-based byte stream over a file (or any reader) that refills a
//! fixed-size buffer one chunk at a time. Memory usage is one chunk
//! regardless of file size.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::utils::DatasetError;

/// Default read chunk size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Fixed-chunk byte source with single-byte pull and peek
#[derive(Debug)]
pub struct ChunkedByteSource<R> {
    inner: R,
    buf: Vec<u8>,
    chunk_size: usize,
    /// Next unread position within `buf`
    pos: usize,
    /// Absolute offset of `buf[pos]` in the underlying stream
    offset: u64,
    eof: bool,
}

impl ChunkedByteSource<File> {
    /// Open a file for chunked binary reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(file))
    }
}

impl<R: Read> ChunkedByteSource<R> {
    /// Wrap a reader with the default chunk size
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Wrap a reader with an explicit chunk size (must be nonzero)
    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be nonzero");
        Self {
            inner,
            buf: Vec::new(),
            chunk_size,
            pos: 0,
            offset: 0,
            eof: false,
        }
    }

    /// Absolute byte offset of the next unconsumed byte
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Look at the next byte without consuming it, or `None` at end of stream
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        if self.pos >= self.buf.len() {
            self.refill()?;
        }
        Ok(self.buf.get(self.pos).copied())
    }

    /// Consume and return the next byte, or `None` at end of stream
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek()?;
        if byte.is_some() {
            self.pos += 1;
            self.offset += 1;
        }
        Ok(byte)
    }

    fn refill(&mut self) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }
        self.buf.resize(self.chunk_size, 0);
        let n = loop {
            match self.inner.read(&mut self.buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.buf.clear();
                    self.pos = 0;
                    return Err(e);
                }
            }
        };
        self.buf.truncate(n);
        self.pos = 0;
        if n == 0 {
            self.eof = true;
        }
        Ok(())
    }
}
