//! Record batching buffer
//!
//! Extracted records are collected here and handed to a [`BatchSink`] in
//! batches. The size check and the flush it may trigger happen under a
//! single lock, so a buffer shared between tasks never sends the same
//! records twice.

use crate::record::ProductRecord;
use crate::ScraperError;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of records collected before a flush is triggered
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Destination for flushed batches
pub trait BatchSink {
    /// Writes a batch of records
    ///
    /// The buffer keeps the records if this returns an error, so a later
    /// flush retries them.
    fn write_batch(&mut self, records: &[ProductRecord]) -> Result<(), ScraperError>;
}

/// Counters describing what the buffer has flushed so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferStats {
    pub flushes: u64,
    pub records_flushed: u64,
}

struct Inner<S> {
    records: Vec<ProductRecord>,
    sink: S,
    stats: BufferStats,
}

impl<S: BatchSink> Inner<S> {
    fn flush(&mut self) -> Result<usize, ScraperError> {
        if self.records.is_empty() {
            return Ok(0);
        }

        let count = self.records.len();
        tracing::info!("Flushing {} records", count);
        self.sink.write_batch(&self.records)?;

        self.records.clear();
        self.stats.flushes += 1;
        self.stats.records_flushed += count as u64;
        Ok(count)
    }
}

/// Buffer that batches product records in insertion order
pub struct RecordBuffer<S> {
    inner: Mutex<Inner<S>>,
    threshold: usize,
}

impl<S: BatchSink> RecordBuffer<S> {
    /// Creates a buffer flushing into `sink` every `threshold` records
    ///
    /// A threshold of zero is treated as one.
    pub fn new(sink: S, threshold: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: Vec::with_capacity(threshold),
                sink,
                stats: BufferStats::default(),
            }),
            threshold: threshold.max(1),
        }
    }

    /// Appends a record, flushing if the buffer reached its threshold
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The append triggered a flush
    /// * `Ok(false)` - The record was buffered
    /// * `Err(ScraperError)` - The triggered flush failed; all records stay buffered
    pub fn append(&self, record: ProductRecord) -> Result<bool, ScraperError> {
        let mut inner = self.lock();
        inner.records.push(record);

        if inner.records.len() >= self.threshold {
            inner.flush()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Writes out whatever is buffered, regardless of size
    ///
    /// Returns the number of records written; an empty buffer is a no-op.
    pub fn flush(&self) -> Result<usize, ScraperError> {
        self.lock().flush()
    }

    /// Number of records waiting to be flushed
    pub fn pending(&self) -> usize {
        self.lock().records.len()
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn stats(&self) -> BufferStats {
        self.lock().stats
    }

    /// Consumes the buffer and returns its sink
    ///
    /// Records still buffered are discarded.
    pub fn into_sink(self) -> S {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .sink
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        // A panic inside a sink leaves the records untouched, so the data is still usable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
