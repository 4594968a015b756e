#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! ## Modules
//!
//! - [`record`] — Decoded record structures (`Record`, `Field`, `Subfield`)
//! - [`leader`] — Record leader (24-byte header)
//! - [`reader`] — Reading ISO 2709 records from byte streams
//! - [`source`] — Opening record sources (files, gzip, stdin)
//! - [`rules`] — Declarative extraction rules
//! - [`codes`] — Language and country code tables
//! - [`lookup`] — Fixed location, collection, format, and content type tables
//! - [`document`] — Normalized search documents
//! - [`mapper`] — Record to document mapping
//! - [`pipeline`] — Producer-consumer ingest pipeline
//! - [`indexer`] — Batched bulk writes
//! - [`engine`] — Search engine trait and clients
//! - [`lifecycle`] — Index administration and alias promotion
//! - [`config`] — Run configuration
//! - [`error`] — Error types and result type

pub mod codes;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod leader;
pub mod lifecycle;
pub mod lookup;
pub mod mapper;
pub mod pipeline;
pub mod reader;
/// Decoded record structures (`Record`, `Field`, `Subfield`)
pub mod record;
pub mod rules;
pub mod source;

pub use codes::{translate, CodeTable};
pub use config::IngestConfig;
pub use document::{Contributor, Document, Holding, Link, RelatedItem};
pub use engine::{HttpEngine, MemoryEngine, SearchEngine};
pub use error::{IngestError, Result};
pub use indexer::BulkIndexer;
pub use leader::Leader;
pub use lifecycle::IndexLifecycleManager;
pub use mapper::{MappingContext, RecordMapper};
pub use pipeline::{
    ingest, run_pipeline, DocumentSink, IngestReport, IngestRequest, JsonLinesSink,
    PipelineConfig, PipelineReport, StreamStats, Streamer, TitleSink,
};
pub use reader::MarcReader;
pub use record::{Field, FieldBuilder, Record, RecordBuilder, Subfield};
pub use rules::{ByteRange, FieldSpec, Rule, Ruleset};
