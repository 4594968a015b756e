//! Elasticsearch-compatible REST client.

use super::{AliasAction, AliasInfo, BulkSummary, ClusterInfo, IndexInfo, SearchEngine};
use crate::document::Document;
use crate::error::{IngestError, Result};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const NDJSON: &str = "application/x-ndjson";
const USER_AGENT: &str = concat!("mrrc-ingest/", env!("CARGO_PKG_VERSION"));

/// [`SearchEngine`] over the engine's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpEngine {
    client: Client,
    base_url: String,
}

impl HttpEngine {
    /// Create a client for the engine at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] for an empty URL, or
    /// [`IngestError::Http`] if the client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(IngestError::Config("Search engine URL is empty".to_string()));
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(HttpEngine {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// The engine URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl SearchEngine for HttpEngine {
    fn bulk(&self, index: &str, documents: &[Document]) -> Result<BulkSummary> {
        if documents.is_empty() {
            return Ok(BulkSummary::default());
        }
        let body = bulk_body(index, documents)?;
        debug!(index, documents = documents.len(), bytes = body.len(), "POST _bulk");
        let response = self
            .client
            .post(self.url("_bulk"))
            .header(CONTENT_TYPE, NDJSON)
            .body(body)
            .send()?;
        let response: BulkResponse = check(response)?.json()?;
        Ok(summarize_bulk(response))
    }

    fn indexes(&self) -> Result<Vec<IndexInfo>> {
        let response = self
            .client
            .get(self.url("_cat/indices?format=json"))
            .send()?;
        let rows: Vec<CatIndex> = check(response)?.json()?;
        Ok(rows.into_iter().map(IndexInfo::from).collect())
    }

    fn aliases(&self) -> Result<Vec<AliasInfo>> {
        let response = self
            .client
            .get(self.url("_cat/aliases?format=json"))
            .send()?;
        Ok(check(response)?.json()?)
    }

    fn alias_targets(&self, alias: &str) -> Result<Vec<String>> {
        let response = self.client.get(self.url(&format!("_alias/{alias}"))).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let targets: HashMap<String, Value> = check(response)?.json()?;
        let mut targets: Vec<String> = targets.into_keys().collect();
        targets.sort();
        Ok(targets)
    }

    fn exists(&self, index: &str) -> Result<bool> {
        let response = self.client.head(self.url(index)).send()?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => check(response).map(|_| false),
        }
    }

    fn delete_index(&self, index: &str) -> Result<()> {
        let response = self.client.delete(self.url(index)).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(IngestError::IndexNotFound(index.to_string()));
        }
        check(response)?;
        Ok(())
    }

    fn update_aliases(&self, actions: &[AliasAction]) -> Result<()> {
        let response = self
            .client
            .post(self.url("_aliases"))
            .json(&json!({ "actions": actions }))
            .send()?;
        check(response)?;
        Ok(())
    }

    fn reindex(&self, source: &str, destination: &str) -> Result<u64> {
        if !self.exists(source)? {
            return Err(IngestError::IndexNotFound(source.to_string()));
        }
        let body = json!({
            "source": { "index": source },
            "dest": { "index": destination },
        });
        let response = self
            .client
            .post(self.url("_reindex?wait_for_completion=true"))
            .json(&body)
            .send()?;
        let response: ReindexResponse = check(response)?.json()?;
        if let Some(failure) = response.failures.first() {
            return Err(IngestError::Engine {
                status: failure
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|s| u16::try_from(s).ok())
                    .unwrap_or(500),
                message: format!(
                    "{} of {} documents failed to copy: {failure}",
                    response.failures.len(),
                    response.total
                ),
            });
        }
        Ok(response.created + response.updated)
    }

    fn info(&self) -> Result<ClusterInfo> {
        let response = self.client.get(self.url("")).send()?;
        let root: RootResponse = check(response)?.json()?;
        Ok(ClusterInfo {
            name: root.name,
            cluster_name: root.cluster_name,
            version: root.version.number,
            lucene_version: root.version.lucene_version,
        })
    }
}

/// Pass successful responses through; turn the rest into [`IngestError::Engine`].
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    Err(IngestError::Engine {
        status: status.as_u16(),
        message,
    })
}

/// NDJSON body of a bulk request.
///
/// Each document is keyed by its identifier; documents without one are left
/// for the engine to assign an `_id`.
fn bulk_body(index: &str, documents: &[Document]) -> Result<String> {
    let mut body = String::new();
    for doc in documents {
        let action = if doc.identifier.is_empty() {
            json!({ "index": { "_index": index } })
        } else {
            json!({ "index": { "_index": index, "_id": doc.identifier } })
        };
        body.push_str(&action.to_string());
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }
    Ok(body)
}

fn summarize_bulk(response: BulkResponse) -> BulkSummary {
    let mut summary = BulkSummary::default();
    for item in response.items.into_iter().flat_map(HashMap::into_values) {
        if (200..300).contains(&item.status) {
            summary.indexed += 1;
        } else {
            summary.failed += 1;
            if summary.first_error.is_none() {
                let reason = item.error.map_or_else(
                    || format!("status {}", item.status),
                    |e| e.to_string(),
                );
                summary.first_error = Some(format!(
                    "document {}: {reason}",
                    item.id.unwrap_or_default()
                ));
            }
        }
    }
    summary
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(rename = "_id")]
    id: Option<String>,
    status: u16,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CatIndex {
    index: String,
    health: Option<String>,
    status: Option<String>,
    uuid: Option<String>,
    #[serde(rename = "docs.count")]
    docs_count: Option<String>,
    #[serde(rename = "store.size")]
    store_size: Option<String>,
}

impl From<CatIndex> for IndexInfo {
    fn from(row: CatIndex) -> Self {
        IndexInfo {
            name: row.index,
            health: row.health.unwrap_or_default(),
            status: row.status.unwrap_or_default(),
            uuid: row.uuid.unwrap_or_default(),
            doc_count: row
                .docs_count
                .and_then(|c| c.parse().ok())
                .unwrap_or_default(),
            store_size: row.store_size.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReindexResponse {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    created: u64,
    #[serde(default)]
    updated: u64,
    #[serde(default)]
    failures: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RootResponse {
    name: String,
    cluster_name: String,
    version: RootVersion,
}

#[derive(Debug, Deserialize)]
struct RootVersion {
    number: String,
    #[serde(default)]
    lucene_version: String,
}
