//! Index administration and blue/green alias swaps.
//!
//! A production alias always names exactly one index. A new index is built
//! alongside the live one, checked, and then [promoted](IndexLifecycleManager::promote):
//! the alias moves in a single atomic update, and the old index stays
//! addressable by name until it is deleted.

use crate::engine::{AliasAction, AliasInfo, ClusterInfo, IndexInfo, SearchEngine};
use crate::error::{IngestError, Result};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::info;

/// Name for a new index under `prefix`, e.g. `marc-2024-03-01t12-30-00z`.
#[must_use]
pub fn timestamped_index_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}-{}", at.format("%Y-%m-%dt%H-%M-%Sz"))
}

/// Synchronous administration calls against one engine.
pub struct IndexLifecycleManager<'a, E: SearchEngine + ?Sized> {
    engine: &'a E,
}

impl<'a, E: SearchEngine + ?Sized> IndexLifecycleManager<'a, E> {
    /// Wrap an engine.
    pub fn new(engine: &'a E) -> Self {
        IndexLifecycleManager { engine }
    }

    /// Current indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be queried.
    pub fn list_indexes(&self) -> Result<Vec<IndexInfo>> {
        self.engine.indexes()
    }

    /// Current alias bindings.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be queried.
    pub fn list_aliases(&self) -> Result<Vec<AliasInfo>> {
        self.engine.aliases()
    }

    /// Delete `index`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::IndexNotFound`] if it does not exist.
    pub fn delete(&self, index: &str) -> Result<()> {
        self.engine.delete_index(index)?;
        info!(index, "deleted index");
        Ok(())
    }

    /// Point the alias `alias` at `index` and nothing else.
    ///
    /// Every removal and the addition go to the engine as one alias update,
    /// so readers of the alias see either the old target or the new one.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::IndexNotFound`] if `index` does not exist, or
    /// the engine's error if it rejects the update. On error the alias is
    /// unchanged.
    pub fn promote(&self, index: &str, alias: &str) -> Result<()> {
        if alias.is_empty() {
            return Err(IngestError::Config("Alias name is empty".to_string()));
        }
        if !self.engine.exists(index)? {
            return Err(IngestError::IndexNotFound(index.to_string()));
        }

        let previous = self.engine.alias_targets(alias)?;
        let mut actions: Vec<AliasAction> = previous
            .iter()
            .filter(|old| old.as_str() != index)
            .map(|old| AliasAction::Remove {
                index: old.clone(),
                alias: alias.to_string(),
            })
            .collect();
        actions.push(AliasAction::Add {
            index: index.to_string(),
            alias: alias.to_string(),
        });

        self.engine.update_aliases(&actions)?;
        info!(alias, index, ?previous, "promoted alias");
        Ok(())
    }

    /// Copy every document from `source` into `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::IndexNotFound`] if `source` does not exist, or
    /// an engine error if any document failed to copy.
    pub fn reindex(&self, source: &str, destination: &str) -> Result<u64> {
        if source == destination {
            return Err(IngestError::Config(format!(
                "Cannot reindex {source} into itself"
            )));
        }
        let copied = self.engine.reindex(source, destination)?;
        info!(source, destination, copied, "reindexed");
        Ok(copied)
    }

    /// Engine identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is unreachable.
    pub fn ping(&self) -> Result<ClusterInfo> {
        self.engine.info()
    }
}

impl<E: SearchEngine + ?Sized> fmt::Debug for IndexLifecycleManager<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexLifecycleManager").finish_non_exhaustive()
    }
}
