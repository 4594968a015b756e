//! Error types for ingest and index administration.
//!
//! This module provides the [`IngestError`] type for all crate operations
//! and the [`Result`] convenience type.

use thiserror::Error;

/// Error type for all ingest, mapping, and index administration operations.
///
/// Variants fall into the families the pipeline treats differently:
/// configuration errors abort before any record is read, per-record decode
/// and mapping errors skip one record, and engine errors are surfaced to the
/// caller without retry.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Missing or invalid ruleset, code table, or configuration file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error indicating an invalid or malformed MARC record.
    #[error("Invalid MARC record: {0}")]
    InvalidRecord(String),

    /// Error indicating an invalid leader (24-byte header).
    #[error("Invalid leader: {0}")]
    InvalidLeader(String),

    /// Error indicating an invalid field structure.
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Error indicating a truncated or incomplete record.
    #[error("Truncated record: {0}")]
    TruncatedRecord(String),

    /// A record produced no value for the required title rule.
    #[error("Record {0} has no title, check validity")]
    MissingTitle(String),

    /// A byte-range restriction fell outside the extracted value.
    #[error("Field {tag}: byte range {range} out of bounds for value of {len} bytes")]
    FieldExtraction {
        /// Tag of the field the rule was applied to
        tag: String,
        /// The `start:length` restriction as written in the ruleset
        range: String,
        /// Length in bytes of the concatenated subfield value
        len: usize,
    },

    /// The named index does not exist on the search engine.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// The search engine rejected a request.
    #[error("Search engine error {status}: {message}")]
    Engine {
        /// HTTP status returned by the engine
        status: u16,
        /// Engine-supplied reason
        message: String,
    },

    /// Transport failure talking to the search engine.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A bulk batch was rejected after some documents were confirmed.
    #[error("Bulk write failed after {indexed} documents: {message}")]
    BulkWrite {
        /// Documents confirmed by the engine before the failure
        indexed: usize,
        /// Engine-supplied reason
        message: String,
    },

    /// The configured limit of consecutive undecodable records was reached.
    #[error("Aborting after {0} consecutive record decode errors")]
    TooManyDecodeErrors(usize),

    /// The hand-off queue closed unexpectedly.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// JSON encoding or decoding failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error from the underlying source/destination.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// True for errors that only invalidate the current record, i.e. a
    /// decode error or a mapping error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.is_decode_error() || self.is_mapping_error()
    }

    /// True for structural decode errors of a single record.
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            IngestError::InvalidRecord(_)
                | IngestError::InvalidLeader(_)
                | IngestError::InvalidField(_)
                | IngestError::TruncatedRecord(_)
        )
    }

    /// True for errors raised while mapping a decoded record.
    #[must_use]
    pub fn is_mapping_error(&self) -> bool {
        matches!(
            self,
            IngestError::MissingTitle(_) | IngestError::FieldExtraction { .. }
        )
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        IngestError::Http(e.to_string())
    }
}

/// Convenience type alias for [`std::result::Result`] with [`IngestError`].
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(IngestError::InvalidLeader("x".to_string()).is_recoverable());
        assert!(IngestError::TruncatedRecord("x".to_string()).is_decode_error());
        assert!(IngestError::MissingTitle("001".to_string()).is_mapping_error());
        assert!(IngestError::FieldExtraction {
            tag: "008".to_string(),
            range: "35:3".to_string(),
            len: 10,
        }
        .is_recoverable());

        assert!(!IngestError::Config("bad".to_string()).is_recoverable());
        assert!(!IngestError::IndexNotFound("idx".to_string()).is_recoverable());
        assert!(!IngestError::TooManyDecodeErrors(3).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = IngestError::MissingTitle("12345".to_string());
        assert_eq!(err.to_string(), "Record 12345 has no title, check validity");

        let err = IngestError::BulkWrite {
            indexed: 40,
            message: "rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Bulk write failed after 40 documents: rejected"
        );
    }
}
