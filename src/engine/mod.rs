//! Search engine collaborators.
//!
//! [`SearchEngine`] is the seam between the ingest pipeline and the remote
//! index. Two implementations are provided:
//!
//! | Engine | Module | Description |
//! |--------|--------|-------------|
//! | [`HttpEngine`] | `http` | Elasticsearch-compatible REST client |
//! | [`MemoryEngine`] | `memory` | In-process engine for tests and dry runs |
//!
//! # Usage
//!
//! ```
//! use mrrc_ingest::engine::{MemoryEngine, SearchEngine};
//! use mrrc_ingest::Document;
//!
//! let engine = MemoryEngine::new();
//! let doc = Document { identifier: "1".into(), title: "A title".into(), ..Document::default() };
//! let summary = engine.bulk("marc-1", &[doc]).unwrap();
//! assert_eq!(summary.indexed, 1);
//! assert!(engine.exists("marc-1").unwrap());
//! ```

mod http;
mod memory;

pub use http::HttpEngine;
pub use memory::MemoryEngine;

use crate::document::Document;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Operations the pipeline and lifecycle manager need from a search engine.
///
/// Every call is synchronous request/response; implementations carry no
/// state shared with the ingest pipeline.
pub trait SearchEngine: Send + Sync {
    /// Write documents to `index`, creating it if needed.
    ///
    /// Rejections of individual documents are reported in the summary, not
    /// as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the request as a whole fails.
    fn bulk(&self, index: &str, documents: &[Document]) -> Result<BulkSummary>;

    /// Every index with its health and size.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be queried.
    fn indexes(&self) -> Result<Vec<IndexInfo>>;

    /// Every alias and the index it points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be queried.
    fn aliases(&self) -> Result<Vec<AliasInfo>>;

    /// Indexes currently behind `alias`; empty if the alias does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be queried.
    fn alias_targets(&self, alias: &str) -> Result<Vec<String>>;

    /// True if `index` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be queried.
    fn exists(&self, index: &str) -> Result<bool>;

    /// Remove `index`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::IndexNotFound`](crate::IngestError::IndexNotFound)
    /// if there is no such index.
    fn delete_index(&self, index: &str) -> Result<()>;

    /// Apply all alias actions as one atomic update.
    ///
    /// # Errors
    ///
    /// Returns an error, with no action applied, if any action is invalid.
    fn update_aliases(&self, actions: &[AliasAction]) -> Result<()>;

    /// Copy every document of `source` into `destination` server-side and
    /// return the number copied.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::IndexNotFound`](crate::IngestError::IndexNotFound)
    /// if `source` does not exist, or an engine error if any copy failed.
    fn reindex(&self, source: &str, destination: &str) -> Result<u64>;

    /// Liveness and version probe.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unreachable.
    fn info(&self) -> Result<ClusterInfo>;
}

/// Outcome of one bulk request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Documents the engine accepted
    pub indexed: usize,
    /// Documents the engine rejected
    pub failed: usize,
    /// Reason given for the first rejection
    pub first_error: Option<String>,
}

impl BulkSummary {
    /// True if any document was rejected.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// One entry in an atomic alias update.
///
/// Serializes to the engine's `_aliases` action shape, e.g.
/// `{"add": {"index": "marc-2", "alias": "marc"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasAction {
    /// Point `alias` at `index`
    Add {
        /// Target index
        index: String,
        /// Alias name
        alias: String,
    },
    /// Stop pointing `alias` at `index`
    Remove {
        /// Current target index
        index: String,
        /// Alias name
        alias: String,
    },
}

/// Summary of one index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    /// Index name
    pub name: String,
    /// green, yellow, or red
    pub health: String,
    /// open or close
    pub status: String,
    /// Engine-assigned identifier
    pub uuid: String,
    /// Number of documents
    pub doc_count: u64,
    /// Human-readable on-disk size
    pub store_size: String,
}

/// One alias binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasInfo {
    /// Alias name
    pub alias: String,
    /// Index it points at
    pub index: String,
}

/// Engine identity reported by the info probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterInfo {
    /// Node name
    pub name: String,
    /// Cluster name
    pub cluster_name: String,
    /// Engine version
    pub version: String,
    /// Lucene version
    pub lucene_version: String,
}
