//! Declarative extraction rules.
//!
//! A [`Ruleset`] maps each logical output field (a rule `label`) to one or
//! more [`FieldSpec`]s naming a tag, the subfield codes to collect, an
//! optional `start:length` byte range, and an optional role `kind`. Rules are
//! read once from JSON:
//!
//! ```json
//! [
//!   {"label": "title", "array": false,
//!    "fields": [{"tag": "245", "subfields": "abfgknps"}]},
//!   {"label": "languages", "array": true,
//!    "fields": [{"tag": "008", "subfields": "", "bytes": "35:3"},
//!               {"tag": "041", "subfields": "a"}]}
//! ]
//! ```
//!
//! Loading builds a label-indexed map and checks every byte range, so a
//! malformed ruleset fails before any record is read. [`Ruleset::require`]
//! checks that the labels a caller will ask for exist.

use crate::error::{IngestError, Result};
use crate::record::{is_control_tag, Record};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A `start:length` restriction applied to an extracted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRange {
    /// Offset of the first byte kept
    pub start: usize,
    /// Number of bytes kept
    pub length: usize,
}

impl ByteRange {
    /// Parse the ruleset notation `start:length`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] unless both parts are unsigned integers.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid =
            || IngestError::Config(format!("Invalid byte range '{spec}', expected start:length"));
        let (start, length) = spec.split_once(':').ok_or_else(invalid)?;
        Ok(ByteRange {
            start: start.trim().parse().map_err(|_| invalid())?,
            length: length.trim().parse().map_err(|_| invalid())?,
        })
    }

    /// Apply the range to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::FieldExtraction`] if the range runs past the
    /// end of `value` or splits a multi-byte character.
    pub fn apply<'a>(&self, tag: &str, value: &'a str) -> Result<&'a str> {
        self.start
            .checked_add(self.length)
            .and_then(|end| value.get(self.start..end))
            .ok_or_else(|| IngestError::FieldExtraction {
                tag: tag.to_string(),
                range: self.to_string(),
                len: value.len(),
            })
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.length)
    }
}

/// One tag/subfield selection inside a [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Record tag to collect
    pub tag: String,
    /// Subfield codes to collect; empty selects all subfields
    pub subfields: Vec<char>,
    /// Optional byte range applied after subfield concatenation
    pub bytes: Option<ByteRange>,
    /// Role attached to values from this spec, e.g. a contributor type
    pub kind: Option<String>,
}

impl FieldSpec {
    /// Collect one value per occurrence of the tag in `record`.
    ///
    /// Control tags yield their whole value. Data fields yield the requested
    /// subfields joined by a space, in record order; an occurrence carrying
    /// none of them yields nothing. Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::FieldExtraction`] if a byte range does not fit.
    pub fn extract(&self, record: &Record) -> Result<Vec<String>> {
        let values: Vec<String> = if is_control_tag(&self.tag) {
            record
                .get_control_field(&self.tag)
                .map(str::to_string)
                .into_iter()
                .collect()
        } else {
            record
                .fields_by_tag(&self.tag)
                .filter_map(|field| {
                    let parts = field.select_subfields(&self.subfields);
                    (!parts.is_empty()).then(|| parts.join(" "))
                })
                .collect()
        };

        match &self.bytes {
            None => Ok(values),
            Some(range) => values
                .iter()
                .map(|v| range.apply(&self.tag, v).map(str::to_string))
                .collect(),
        }
    }
}

/// A logical output field and where its values come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Output field name
    pub label: String,
    /// Whether the output field is multi-valued
    pub array: bool,
    /// Selections unioned to produce the field
    pub fields: Vec<FieldSpec>,
}

impl Rule {
    /// Union the values of every spec, dropping exact duplicates.
    ///
    /// Order of first appearance is preserved. No match yields an empty vector.
    ///
    /// # Errors
    ///
    /// Propagates [`IngestError::FieldExtraction`] from any spec.
    pub fn extract(&self, record: &Record) -> Result<Vec<String>> {
        let mut out: Vec<String> = Vec::new();
        for spec in &self.fields {
            for value in spec.extract(record)? {
                if !out.contains(&value) {
                    out.push(value);
                }
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct RawRule {
    label: String,
    #[serde(default)]
    array: bool,
    #[serde(default)]
    fields: Vec<RawFieldSpec>,
}

#[derive(Debug, Deserialize)]
struct RawFieldSpec {
    tag: String,
    #[serde(default)]
    subfields: String,
    #[serde(default)]
    bytes: String,
    #[serde(default)]
    kind: String,
}

impl TryFrom<RawFieldSpec> for FieldSpec {
    type Error = IngestError;

    fn try_from(raw: RawFieldSpec) -> Result<Self> {
        if raw.tag.len() != 3 {
            return Err(IngestError::Config(format!(
                "Invalid tag '{}' in ruleset",
                raw.tag
            )));
        }
        let bytes = if raw.bytes.trim().is_empty() {
            None
        } else {
            Some(ByteRange::parse(&raw.bytes)?)
        };
        Ok(FieldSpec {
            tag: raw.tag,
            subfields: raw.subfields.chars().collect(),
            bytes,
            kind: (!raw.kind.is_empty()).then_some(raw.kind),
        })
    }
}

/// Immutable rules keyed by label.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    rules: IndexMap<String, Rule>,
}

impl Ruleset {
    /// Build a ruleset, rejecting duplicate labels.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if two rules share a label.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self> {
        let mut map = IndexMap::with_capacity(rules.len());
        for rule in rules {
            if map.contains_key(&rule.label) {
                return Err(IngestError::Config(format!(
                    "Duplicate rule label '{}'",
                    rule.label
                )));
            }
            map.insert(rule.label.clone(), rule);
        }
        Ok(Ruleset { rules: map })
    }

    /// Parse a JSON array of rules.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] for malformed JSON, tags, byte ranges,
    /// or duplicate labels.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawRule> = serde_json::from_str(json)
            .map_err(|e| IngestError::Config(format!("Invalid ruleset: {e}")))?;

        let rules = raw
            .into_iter()
            .map(|r| {
                Ok(Rule {
                    label: r.label,
                    array: r.array,
                    fields: r
                        .fields
                        .into_iter()
                        .map(FieldSpec::try_from)
                        .collect::<Result<_>>()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_rules(rules)
    }

    /// Read and parse a ruleset file.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the file is unreadable or invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!("Cannot read ruleset {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Check that every label in `labels` has a rule.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] listing all missing labels.
    pub fn require(&self, labels: &[&str]) -> Result<()> {
        let missing: Vec<&str> = labels
            .iter()
            .copied()
            .filter(|label| !self.rules.contains_key(*label))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(IngestError::Config(format!(
                "Ruleset is missing rules for: {}",
                missing.join(", ")
            )))
        }
    }

    /// Look up the rule for `label`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if no rule has that label.
    pub fn get(&self, label: &str) -> Result<&Rule> {
        self.rules
            .get(label)
            .ok_or_else(|| IngestError::Config(format!("No rule for label '{label}'")))
    }

    /// Apply the rule for `label` to `record`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] for an unknown label, or a
    /// [`IngestError::FieldExtraction`] from a byte range.
    pub fn apply_rule(&self, record: &Record, label: &str) -> Result<Vec<String>> {
        self.get(label)?.extract(record)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
