//! Run configuration.
//!
//! Every setting has a default, so an empty or absent TOML file is valid.
//! The command line overrides individual values after loading.

use crate::codes::CodeTable;
use crate::error::{IngestError, Result};
use crate::mapper::{MappingContext, RecordMapper};
use crate::pipeline::PipelineConfig;
use crate::rules::Ruleset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn default_engine_url() -> String {
    "http://127.0.0.1:9200".to_string()
}

fn default_rules_path() -> PathBuf {
    PathBuf::from("config/marc_rules.json")
}

fn default_language_codes_path() -> PathBuf {
    PathBuf::from("config/languages.xml")
}

fn default_country_codes_path() -> PathBuf {
    PathBuf::from("config/countries.xml")
}

fn default_batch_size() -> usize {
    500
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_source_name() -> String {
    "MIT Aleph".to_string()
}

fn default_source_link_base() -> String {
    "https://library.mit.edu/item/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Settings for ingest and administration runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// Search engine base URL
    #[serde(default = "default_engine_url")]
    pub engine_url: String,
    /// Mapping ruleset (JSON)
    #[serde(default = "default_rules_path")]
    pub rules_path: PathBuf,
    /// Language code list (XML)
    #[serde(default = "default_language_codes_path")]
    pub language_codes_path: PathBuf,
    /// Country code list (XML)
    #[serde(default = "default_country_codes_path")]
    pub country_codes_path: PathBuf,
    /// Documents per bulk request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Capacity of the hand-off queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Abort after this many undecodable records in a row
    #[serde(default)]
    pub max_consecutive_decode_errors: Option<usize>,
    /// Value of every document's `source`
    #[serde(default = "default_source_name")]
    pub source_name: String,
    /// Prefix of every document's `source_link`
    #[serde(default = "default_source_link_base")]
    pub source_link_base: String,
    /// Search engine request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            engine_url: default_engine_url(),
            rules_path: default_rules_path(),
            language_codes_path: default_language_codes_path(),
            country_codes_path: default_country_codes_path(),
            batch_size: default_batch_size(),
            queue_capacity: default_queue_capacity(),
            max_consecutive_decode_errors: None,
            source_name: default_source_name(),
            source_link_base: default_source_link_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the file cannot be read, parsed,
    /// or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!("Failed to read config file '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            IngestError::Config(msg) => {
                IngestError::Config(format!("{msg} (in '{}')", path.display()))
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] for invalid TOML or invalid values.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: IngestConfig = toml::from_str(content)
            .map_err(|e| IngestError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] listing each invalid setting.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.engine_url.trim().is_empty() {
            errors.push("engine_url must not be empty".to_string());
        }
        if self.batch_size == 0 {
            errors.push("batch_size must be positive".to_string());
        }
        if self.queue_capacity == 0 {
            errors.push("queue_capacity must be positive".to_string());
        }
        if self.max_consecutive_decode_errors == Some(0) {
            errors.push("max_consecutive_decode_errors must be positive when set".to_string());
        }
        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(IngestError::Config(errors.join("; ")))
        }
    }

    /// Pipeline tuning derived from this configuration.
    #[must_use]
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            queue_capacity: self.queue_capacity,
            batch_size: self.batch_size,
            max_consecutive_decode_errors: self.max_consecutive_decode_errors,
        }
    }

    /// Search engine request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Load the ruleset and both code tables and build the shared mapper.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if any input is unreadable or the
    /// ruleset lacks a label the mapper needs.
    pub fn load_mapper(&self) -> Result<Arc<RecordMapper>> {
        let ruleset = Ruleset::from_path(&self.rules_path)?;
        let languages = CodeTable::from_path(&self.language_codes_path, "language")?;
        let countries = CodeTable::from_path(&self.country_codes_path, "country")?;
        info!(
            rules = ruleset.len(),
            languages = languages.len(),
            countries = countries.len(),
            "loaded mapping configuration"
        );

        let mapper = RecordMapper::new(MappingContext {
            ruleset,
            languages,
            countries,
            source_name: self.source_name.clone(),
            source_link_base: self.source_link_base.clone(),
        })?;
        Ok(Arc::new(mapper))
    }
}
