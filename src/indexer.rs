//! Batched writes of documents to the search engine.

use crate::document::Document;
use crate::engine::SearchEngine;
use crate::error::{IngestError, Result};
use crate::pipeline::DocumentSink;
use crossbeam_channel::Receiver;
use std::fmt;
use tracing::debug;

/// Consumer that drains the hand-off queue into bulk requests.
///
/// Documents are buffered until `batch_size` are pending, then submitted in
/// one request. The running count only includes documents the engine
/// confirmed. The first batch with any rejection stops the indexer with
/// [`IngestError::BulkWrite`]; documents from earlier batches stay indexed.
pub struct BulkIndexer<'a, E: SearchEngine + ?Sized> {
    engine: &'a E,
    index: String,
    batch_size: usize,
    batch: Vec<Document>,
    indexed: usize,
}

impl<'a, E: SearchEngine + ?Sized> BulkIndexer<'a, E> {
    /// Create an indexer writing to `index`. A `batch_size` of zero is
    /// treated as one.
    pub fn new(engine: &'a E, index: impl Into<String>, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        BulkIndexer {
            engine,
            index: index.into(),
            batch_size,
            batch: Vec::with_capacity(batch_size),
            indexed: 0,
        }
    }

    /// Documents confirmed so far.
    #[must_use]
    pub fn indexed(&self) -> usize {
        self.indexed
    }

    /// Queue one document, submitting the batch once it is full.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::BulkWrite`] if a submitted batch fails.
    pub fn push(&mut self, document: Document) -> Result<()> {
        self.batch.push(document);
        if self.batch.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Submit any pending documents.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::BulkWrite`] carrying the confirmed count if the
    /// request fails or the engine rejects any document.
    pub fn flush(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }

        let summary = self
            .engine
            .bulk(&self.index, &self.batch)
            .map_err(|e| IngestError::BulkWrite {
                indexed: self.indexed,
                message: e.to_string(),
            })?;
        self.indexed += summary.indexed;
        debug!(
            index = %self.index,
            submitted = self.batch.len(),
            accepted = summary.indexed,
            total = self.indexed,
            "bulk batch written"
        );
        self.batch.clear();

        if summary.has_failures() {
            return Err(IngestError::BulkWrite {
                indexed: self.indexed,
                message: format!(
                    "{} documents rejected, first: {}",
                    summary.failed,
                    summary.first_error.unwrap_or_default()
                ),
            });
        }
        Ok(())
    }
}

impl<E: SearchEngine + ?Sized> DocumentSink for BulkIndexer<'_, E> {
    fn drain(&mut self, queue: &Receiver<Document>) -> Result<usize> {
        for document in queue {
            self.push(document)?;
        }
        self.flush()?;
        Ok(self.indexed)
    }
}

impl<E: SearchEngine + ?Sized> fmt::Debug for BulkIndexer<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkIndexer")
            .field("index", &self.index)
            .field("batch_size", &self.batch_size)
            .field("pending", &self.batch.len())
            .field("indexed", &self.indexed)
            .finish()
    }
}
