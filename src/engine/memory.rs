//! In-process search engine.
//!
//! Holds every index in memory behind a single lock, so alias updates are
//! atomic exactly as the remote engine guarantees.

use super::{AliasAction, AliasInfo, BulkSummary, ClusterInfo, IndexInfo, SearchEngine};
use crate::document::Document;
use crate::error::{IngestError, Result};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryIndex {
    uuid: String,
    documents: IndexMap<String, Document>,
    generated_ids: u64,
}

impl MemoryIndex {
    /// Store `doc` under its identifier, or under a generated key when it has none.
    fn store(&mut self, doc: Document) {
        let key = if doc.identifier.is_empty() {
            self.generated_ids += 1;
            format!("_generated-{:08}", self.generated_ids)
        } else {
            doc.identifier.clone()
        };
        self.documents.insert(key, doc);
    }
}

#[derive(Debug, Default)]
struct State {
    indexes: BTreeMap<String, MemoryIndex>,
    aliases: BTreeMap<String, BTreeSet<String>>,
    next_uuid: u64,
    accepted: usize,
}

impl State {
    fn create(&mut self, name: &str) -> &mut MemoryIndex {
        let next_uuid = &mut self.next_uuid;
        self.indexes.entry(name.to_string()).or_insert_with(|| {
            *next_uuid += 1;
            MemoryIndex {
                uuid: format!("mem-{:08}", *next_uuid),
                ..MemoryIndex::default()
            }
        })
    }
}

/// A [`SearchEngine`] that keeps everything in process memory.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: Mutex<State>,
    accept_limit: Option<usize>,
}

impl MemoryEngine {
    /// An empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that rejects every bulk document after the first `limit`.
    ///
    /// Used to exercise partial bulk failures.
    #[must_use]
    pub fn with_accept_limit(limit: usize) -> Self {
        MemoryEngine {
            state: Mutex::default(),
            accept_limit: Some(limit),
        }
    }

    /// Documents stored in `index`, in write order.
    #[must_use]
    pub fn documents(&self, index: &str) -> Vec<Document> {
        self.lock()
            .indexes
            .get(index)
            .map(|i| i.documents.values().cloned().collect())
            .unwrap_or_default()
    }

    // A panic while holding the lock cannot leave the maps half-updated,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SearchEngine for MemoryEngine {
    fn bulk(&self, index: &str, documents: &[Document]) -> Result<BulkSummary> {
        let mut state = self.lock();
        let mut summary = BulkSummary::default();
        let mut accepted = state.accepted;
        let mut batch = Vec::with_capacity(documents.len());

        for doc in documents {
            if self.accept_limit.is_some_and(|limit| accepted >= limit) {
                summary.failed += 1;
                summary.first_error.get_or_insert_with(|| {
                    format!("document {}: engine capacity reached", doc.identifier)
                });
                continue;
            }
            accepted += 1;
            summary.indexed += 1;
            batch.push(doc.clone());
        }

        state.accepted = accepted;
        let target = state.create(index);
        for doc in batch {
            target.store(doc);
        }
        Ok(summary)
    }

    fn indexes(&self) -> Result<Vec<IndexInfo>> {
        let state = self.lock();
        Ok(state
            .indexes
            .iter()
            .map(|(name, index)| IndexInfo {
                name: name.clone(),
                health: "green".to_string(),
                status: "open".to_string(),
                uuid: index.uuid.clone(),
                doc_count: index.documents.len() as u64,
                store_size: String::new(),
            })
            .collect())
    }

    fn aliases(&self) -> Result<Vec<AliasInfo>> {
        let state = self.lock();
        Ok(state
            .aliases
            .iter()
            .flat_map(|(alias, targets)| {
                targets.iter().map(move |index| AliasInfo {
                    alias: alias.clone(),
                    index: index.clone(),
                })
            })
            .collect())
    }

    fn alias_targets(&self, alias: &str) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .aliases
            .get(alias)
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn exists(&self, index: &str) -> Result<bool> {
        Ok(self.lock().indexes.contains_key(index))
    }

    fn delete_index(&self, index: &str) -> Result<()> {
        let mut state = self.lock();
        if state.indexes.remove(index).is_none() {
            return Err(IngestError::IndexNotFound(index.to_string()));
        }
        for targets in state.aliases.values_mut() {
            targets.remove(index);
        }
        state.aliases.retain(|_, targets| !targets.is_empty());
        Ok(())
    }

    fn update_aliases(&self, actions: &[AliasAction]) -> Result<()> {
        let mut state = self.lock();

        // Validate everything before touching the alias table.
        for action in actions {
            let (AliasAction::Add { index, .. } | AliasAction::Remove { index, .. }) = action;
            if !state.indexes.contains_key(index) {
                return Err(IngestError::IndexNotFound(index.clone()));
            }
            if let AliasAction::Remove { index, alias } = action {
                let bound = state
                    .aliases
                    .get(alias)
                    .is_some_and(|targets| targets.contains(index));
                if !bound {
                    return Err(IngestError::Engine {
                        status: 404,
                        message: format!("alias [{alias}] is not bound to [{index}]"),
                    });
                }
            }
        }

        for action in actions {
            match action {
                AliasAction::Add { index, alias } => {
                    state
                        .aliases
                        .entry(alias.clone())
                        .or_default()
                        .insert(index.clone());
                },
                AliasAction::Remove { index, alias } => {
                    if let Some(targets) = state.aliases.get_mut(alias) {
                        targets.remove(index);
                    }
                },
            }
        }
        state.aliases.retain(|_, targets| !targets.is_empty());
        Ok(())
    }

    fn reindex(&self, source: &str, destination: &str) -> Result<u64> {
        let mut state = self.lock();
        let documents: Vec<Document> = state
            .indexes
            .get(source)
            .ok_or_else(|| IngestError::IndexNotFound(source.to_string()))?
            .documents
            .values()
            .cloned()
            .collect();

        let count = documents.len() as u64;
        let target = state.create(destination);
        for doc in documents {
            target.store(doc);
        }
        Ok(count)
    }

    fn info(&self) -> Result<ClusterInfo> {
        Ok(ClusterInfo {
            name: "memory".to_string(),
            cluster_name: "in-process".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            lucene_version: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> Document {
        Document {
            identifier: id.to_string(),
            title: format!("Title {id}"),
            ..Document::default()
        }
    }

    #[test]
    fn test_bulk_creates_index_and_replaces_by_id() {
        let engine = MemoryEngine::new();
        engine.bulk("marc-1", &[doc("1"), doc("2")]).unwrap();
        engine.bulk("marc-1", &[doc("2")]).unwrap();

        let indexes = engine.indexes().unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].doc_count, 2);
        assert!(indexes[0].uuid.starts_with("mem-"));
    }

    #[test]
    fn test_documents_without_identifier_are_kept_apart() {
        let engine = MemoryEngine::new();
        let summary = engine.bulk("marc-1", &[doc(""), doc("")]).unwrap();
        assert_eq!(summary.indexed, 2);
        engine.bulk("marc-1", &[doc("")]).unwrap();

        assert_eq!(engine.documents("marc-1").len(), 3);
        assert_eq!(engine.reindex("marc-1", "marc-2").unwrap(), 3);
        assert_eq!(engine.documents("marc-2").len(), 3);
    }

    #[test]
    fn test_accept_limit_rejects_overflow() {
        let engine = MemoryEngine::with_accept_limit(3);
        let first = engine.bulk("marc-1", &[doc("1"), doc("2")]).unwrap();
        assert_eq!(first.indexed, 2);

        let second = engine.bulk("marc-1", &[doc("3"), doc("4"), doc("5")]).unwrap();
        assert_eq!(second.indexed, 1);
        assert_eq!(second.failed, 2);
        assert!(second.first_error.unwrap().contains("document 4"));
        assert_eq!(engine.documents("marc-1").len(), 3);
    }

    #[test]
    fn test_delete_missing_index() {
        let engine = MemoryEngine::new();
        let err = engine.delete_index("nope").unwrap_err();
        assert!(matches!(err, IngestError::IndexNotFound(name) if name == "nope"));
    }

    #[test]
    fn test_delete_drops_alias_bindings() {
        let engine = MemoryEngine::new();
        engine.bulk("marc-1", &[doc("1")]).unwrap();
        engine
            .update_aliases(&[AliasAction::Add {
                index: "marc-1".to_string(),
                alias: "marc".to_string(),
            }])
            .unwrap();
        engine.delete_index("marc-1").unwrap();
        assert!(engine.aliases().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_action_applies_nothing() {
        let engine = MemoryEngine::new();
        engine.bulk("marc-1", &[doc("1")]).unwrap();
        let err = engine
            .update_aliases(&[
                AliasAction::Add {
                    index: "marc-1".to_string(),
                    alias: "marc".to_string(),
                },
                AliasAction::Add {
                    index: "missing".to_string(),
                    alias: "marc".to_string(),
                },
            ])
            .unwrap_err();
        assert!(matches!(err, IngestError::IndexNotFound(_)));
        assert!(engine.alias_targets("marc").unwrap().is_empty());
    }

    #[test]
    fn test_reindex_copies_documents() {
        let engine = MemoryEngine::new();
        engine.bulk("marc-1", &[doc("1"), doc("2")]).unwrap();
        assert_eq!(engine.reindex("marc-1", "marc-2").unwrap(), 2);
        assert_eq!(engine.documents("marc-2").len(), 2);
        assert!(matches!(
            engine.reindex("missing", "marc-3"),
            Err(IngestError::IndexNotFound(_))
        ));
        assert!(!engine.exists("marc-3").unwrap());
    }
}
