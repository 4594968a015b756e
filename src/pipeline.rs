//! Producer-consumer ingest pipeline with backpressure.
//!
//! Design:
//! - **Producer:** a [`Streamer`] thread decodes records, maps each one, and
//!   pushes finished documents onto a bounded queue
//! - **Consumer:** a [`DocumentSink`] on the calling thread drains the queue
//! - **Backpressure:** the producer blocks while the queue is full
//! - **Termination:** the producer closes the queue by dropping its sender;
//!   the consumer stops once the queue is closed and empty
//!
//! The ruleset and code tables are shared read-only through
//! [`Arc<RecordMapper>`]; the two threads share nothing else.

use crate::document::Document;
use crate::engine::SearchEngine;
use crate::error::{IngestError, Result};
use crate::indexer::BulkIndexer;
use crate::lifecycle::{timestamped_index_name, IndexLifecycleManager};
use crate::mapper::RecordMapper;
use crate::reader::MarcReader;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

/// Tuning for one ingest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Documents the hand-off queue holds before the producer blocks
    pub queue_capacity: usize,
    /// Documents per bulk request
    pub batch_size: usize,
    /// Abort after this many undecodable records in a row; `None` never aborts
    pub max_consecutive_decode_errors: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1000,
            batch_size: 500,
            max_consecutive_decode_errors: None,
        }
    }
}

/// Consumer end of the pipeline.
pub trait DocumentSink {
    /// Consume documents until the queue is closed and empty.
    ///
    /// Returns the number of documents the sink accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot accept a document. The pipeline
    /// then closes the queue from the consumer side.
    fn drain(&mut self, queue: &Receiver<Document>) -> Result<usize>;
}

/// Record counts kept by the producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Documents pushed onto the queue
    pub emitted: usize,
    /// Records skipped because they could not be decoded
    pub skipped_decode: usize,
    /// Records skipped because they could not be mapped
    pub skipped_mapping: usize,
}

/// Producer: decodes and maps records from a byte stream.
#[derive(Debug)]
pub struct Streamer<R: Read> {
    reader: MarcReader<R>,
    mapper: Arc<RecordMapper>,
    max_consecutive_decode_errors: Option<usize>,
    stats: StreamStats,
}

impl<R: Read> Streamer<R> {
    /// Create a streamer over raw record bytes.
    pub fn new(source: R, mapper: Arc<RecordMapper>) -> Self {
        Streamer {
            reader: MarcReader::new(source),
            mapper,
            max_consecutive_decode_errors: None,
            stats: StreamStats::default(),
        }
    }

    /// Abort after `limit` consecutive decode errors.
    #[must_use]
    pub fn with_decode_error_limit(mut self, limit: Option<usize>) -> Self {
        self.max_consecutive_decode_errors = limit;
        self
    }

    /// Counts so far.
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Stream every record into `queue`.
    ///
    /// Undecodable and unmappable records are logged and skipped. Only
    /// complete documents are sent.
    ///
    /// # Errors
    ///
    /// - [`IngestError::TooManyDecodeErrors`] when the configured limit is hit
    /// - [`IngestError::Io`] if the source fails
    /// - [`IngestError::Pipeline`] if the consumer closed the queue early
    pub fn run(&mut self, queue: &Sender<Document>) -> Result<()> {
        let mut consecutive_decode_errors = 0;

        while let Some(next) = self.reader.next() {
            let position = self.reader.records_read();
            let record = match next {
                Ok(record) => {
                    consecutive_decode_errors = 0;
                    record
                },
                Err(e) if e.is_decode_error() => {
                    self.stats.skipped_decode += 1;
                    consecutive_decode_errors += 1;
                    warn!(record = position, error = %e, "skipping undecodable record");
                    if self
                        .max_consecutive_decode_errors
                        .is_some_and(|limit| consecutive_decode_errors >= limit)
                    {
                        return Err(IngestError::TooManyDecodeErrors(consecutive_decode_errors));
                    }
                    continue;
                },
                Err(e) => return Err(e),
            };

            let document = match self.mapper.map(&record) {
                Ok(document) => document,
                Err(e) if e.is_mapping_error() => {
                    self.stats.skipped_mapping += 1;
                    warn!(
                        record = position,
                        id = record.control_number().unwrap_or_default(),
                        error = %e,
                        "skipping unmappable record"
                    );
                    continue;
                },
                Err(e) => return Err(e),
            };

            queue
                .send(document)
                .map_err(|_| IngestError::Pipeline("queue closed by consumer".to_string()))?;
            self.stats.emitted += 1;
        }

        debug!(
            emitted = self.stats.emitted,
            records = self.reader.records_read(),
            "record stream exhausted"
        );
        Ok(())
    }
}

/// Totals of a finished pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Documents accepted by the sink
    pub consumed: usize,
    /// Producer counts
    pub stream: StreamStats,
}

/// Run a [`Streamer`] thread into `sink` over a bounded queue.
///
/// The sink runs on the calling thread. If it fails, the queue is closed
/// from its side so the producer stops at its next send.
///
/// # Errors
///
/// Returns the sink's error if it failed, otherwise the producer's error.
/// Either way the other side has finished before this returns.
pub fn run_pipeline<R, S>(
    source: R,
    mapper: Arc<RecordMapper>,
    sink: &mut S,
    config: &PipelineConfig,
) -> Result<PipelineReport>
where
    R: Read + Send + 'static,
    S: DocumentSink + ?Sized,
{
    let (sender, receiver) = bounded(config.queue_capacity.max(1));
    let mut streamer =
        Streamer::new(source, mapper).with_decode_error_limit(config.max_consecutive_decode_errors);

    let producer = thread::Builder::new()
        .name("streamer".to_string())
        .spawn(move || {
            let outcome = streamer.run(&sender);
            drop(sender);
            (streamer.stats(), outcome)
        })?;

    let consumed = sink.drain(&receiver);
    drop(receiver);

    let (stream, produced) = producer
        .join()
        .map_err(|_| IngestError::Pipeline("streamer thread panicked".to_string()))?;

    info!(
        consumed = consumed.as_ref().ok(),
        emitted = stream.emitted,
        skipped_decode = stream.skipped_decode,
        skipped_mapping = stream.skipped_mapping,
        "pipeline finished"
    );

    let consumed = consumed?;
    if let Err(e) = produced {
        error!(consumed, error = %e, "record stream aborted");
        return Err(e);
    }
    Ok(PipelineReport { consumed, stream })
}

/// Where and how an ingest run writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestRequest {
    /// Target index; a timestamped name under `prefix` when `None`
    pub index: Option<String>,
    /// Alias and index-name prefix
    pub prefix: String,
    /// Promote the alias `prefix` to the new index after a clean run
    pub auto_promote: bool,
}

/// Outcome of [`ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Index the documents were written to
    pub index: String,
    /// Documents confirmed by the engine
    pub indexed: usize,
    /// Producer counts
    pub stream: StreamStats,
    /// True if the alias was promoted to `index`
    pub promoted: bool,
}

/// Stream records from `source` into a search engine index.
///
/// # Errors
///
/// Returns the first pipeline error (see [`run_pipeline`]) or a promotion
/// failure. Nothing is promoted after a failed run.
pub fn ingest<R, E>(
    source: R,
    mapper: Arc<RecordMapper>,
    engine: &E,
    request: &IngestRequest,
    config: &PipelineConfig,
) -> Result<IngestReport>
where
    R: Read + Send + 'static,
    E: SearchEngine + ?Sized,
{
    let index = request
        .index
        .clone()
        .unwrap_or_else(|| timestamped_index_name(&request.prefix, chrono::Utc::now()));
    info!(%index, prefix = %request.prefix, "starting ingest");

    let mut indexer = BulkIndexer::new(engine, index.clone(), config.batch_size);
    let report = run_pipeline(source, mapper, &mut indexer, config)?;
    info!(%index, indexed = report.consumed, "ingest complete");

    let promoted = if request.auto_promote {
        IndexLifecycleManager::new(engine).promote(&index, &request.prefix)?;
        true
    } else {
        false
    };

    Ok(IngestReport {
        index,
        indexed: report.consumed,
        stream: report.stream,
        promoted,
    })
}

/// Consumer that writes one JSON document per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Create a sink over any writer.
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for JsonLinesSink<W> {
    fn drain(&mut self, queue: &Receiver<Document>) -> Result<usize> {
        let mut count = 0;
        for document in queue {
            serde_json::to_writer(&mut self.writer, &document)?;
            self.writer.write_all(b"\n")?;
            count += 1;
        }
        self.writer.flush()?;
        Ok(count)
    }
}

/// Consumer that writes only document titles, one per line.
#[derive(Debug)]
pub struct TitleSink<W: Write> {
    writer: W,
}

impl<W: Write> TitleSink<W> {
    /// Create a sink over any writer.
    pub fn new(writer: W) -> Self {
        TitleSink { writer }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DocumentSink for TitleSink<W> {
    fn drain(&mut self, queue: &Receiver<Document>) -> Result<usize> {
        let mut count = 0;
        for document in queue {
            writeln!(self.writer, "{}", document.title)?;
            count += 1;
        }
        self.writer.flush()?;
        Ok(count)
    }
}
