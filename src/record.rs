//! Decoded record structures.
//!
//! - [`Record`] — leader plus control and data fields
//! - [`Field`] — a variable data field (010+) with indicators
//! - [`Subfield`] — a coded data element within a field
//!
//! Records are what [`crate::reader::MarcReader`] yields and what the rule
//! engine and mapper read. They are built once per input record and never
//! shared between threads.
//!
//! ```
//! use mrrc_ingest::{Field, Leader, Record};
//!
//! let record = Record::builder(Leader::for_type('a'))
//!     .control_field("001", "990001")
//!     .field(
//!         Field::builder("245", '1', '0')
//!             .subfield('a', "A title")
//!             .build(),
//!     )
//!     .build();
//!
//! assert_eq!(record.control_number(), Some("990001"));
//! assert_eq!(record.fields_by_tag("245").count(), 1);
//! ```

use crate::leader::Leader;
use indexmap::IndexMap;
use smallvec::SmallVec;

/// A decoded bibliographic record.
///
/// Fields are grouped by tag in the order tags first appeared; occurrences
/// of one tag keep their record order.
#[derive(Debug, Clone)]
pub struct Record {
    /// Record leader (24 bytes)
    pub leader: Leader,
    /// Control fields (001-009) - tag -> value
    pub control_fields: IndexMap<String, String>,
    /// Data fields (010+) - tag -> occurrences
    pub fields: IndexMap<String, Vec<Field>>,
}

/// A data field in a record (fields 010 and higher)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field tag (3 characters)
    pub tag: String,
    /// First indicator
    pub indicator1: char,
    /// Second indicator
    pub indicator2: char,
    /// Subfields in record order
    pub subfields: SmallVec<[Subfield; 4]>,
}

/// A subfield within a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfield {
    /// Subfield code (single character)
    pub code: char,
    /// Subfield value
    pub value: String,
}

/// True for tags 001-009, which carry a bare value instead of subfields.
#[must_use]
pub fn is_control_tag(tag: &str) -> bool {
    tag.len() == 3 && tag.starts_with("00") && tag.as_bytes()[2].is_ascii_digit() && tag != "000"
}

impl Record {
    /// Create an empty record with the given leader
    #[must_use]
    pub fn new(leader: Leader) -> Self {
        Record {
            leader,
            control_fields: IndexMap::new(),
            fields: IndexMap::new(),
        }
    }

    /// Create a builder for fluently constructing records
    #[must_use]
    pub fn builder(leader: Leader) -> RecordBuilder {
        RecordBuilder {
            record: Record::new(leader),
        }
    }

    /// Add a control field (001-009)
    pub fn add_control_field(&mut self, tag: String, value: String) {
        self.control_fields.insert(tag, value);
    }

    /// Get a control field value
    #[must_use]
    pub fn get_control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields.get(tag).map(String::as_str)
    }

    /// Add a data field
    pub fn add_field(&mut self, field: Field) {
        self.fields
            .entry(field.tag.clone())
            .or_default()
            .push(field);
    }

    /// Iterate over data fields with a specific tag, in record order
    pub fn fields_by_tag<'a>(&'a self, tag: &str) -> impl Iterator<Item = &'a Field> {
        self.fields
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
    }

    /// The control number (001), used as the document identifier.
    #[must_use]
    pub fn control_number(&self) -> Option<&str> {
        self.get_control_field("001")
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Add a control field
    #[must_use]
    pub fn control_field(mut self, tag: &str, value: &str) -> Self {
        self.record
            .add_control_field(tag.to_string(), value.to_string());
        self
    }

    /// Add a data field
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.record.add_field(field);
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Record {
        self.record
    }
}

impl Field {
    /// Create a new data field
    #[must_use]
    pub fn new(tag: String, indicator1: char, indicator2: char) -> Self {
        Field {
            tag,
            indicator1,
            indicator2,
            subfields: SmallVec::new(),
        }
    }

    /// Create a builder for constructing fields fluently
    #[must_use]
    pub fn builder(tag: &str, indicator1: char, indicator2: char) -> FieldBuilder {
        FieldBuilder {
            field: Field::new(tag.to_string(), indicator1, indicator2),
        }
    }

    /// Add a subfield
    pub fn add_subfield(&mut self, code: char, value: String) {
        self.subfields.push(Subfield { code, value });
    }

    /// Get first value for a subfield code
    #[must_use]
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.value.as_str())
    }

    /// First value for `code`, or the empty string when absent.
    #[must_use]
    pub fn subfield_or_empty(&self, code: char) -> &str {
        self.get_subfield(code).unwrap_or("")
    }

    /// Values of subfields whose code is in `codes`, in record order.
    ///
    /// An empty `codes` selects every subfield.
    #[must_use]
    pub fn select_subfields(&self, codes: &[char]) -> Vec<&str> {
        self.subfields
            .iter()
            .filter(|sf| codes.is_empty() || codes.contains(&sf.code))
            .map(|sf| sf.value.as_str())
            .collect()
    }
}

/// Builder for [`Field`].
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Add a subfield
    #[must_use]
    pub fn subfield(mut self, code: char, value: &str) -> Self {
        self.field.add_subfield(code, value.to_string());
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> Field {
        self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_tag_detection() {
        assert!(is_control_tag("001"));
        assert!(is_control_tag("008"));
        assert!(!is_control_tag("000"));
        assert!(!is_control_tag("010"));
        assert!(!is_control_tag("245"));
        assert!(!is_control_tag("00"));
    }

    #[test]
    fn test_fields_by_tag_keeps_order() {
        let record = Record::builder(Leader::for_type('a'))
            .field(Field::builder("650", ' ', '0').subfield('a', "First").build())
            .field(Field::builder("245", '1', '0').subfield('a', "Title").build())
            .field(Field::builder("650", ' ', '0').subfield('a', "Second").build())
            .build();

        let subjects: Vec<_> = record
            .fields_by_tag("650")
            .filter_map(|f| f.get_subfield('a'))
            .collect();
        assert_eq!(subjects, vec!["First", "Second"]);
        assert_eq!(record.fields_by_tag("700").count(), 0);
    }

    #[test]
    fn test_select_subfields_in_record_order() {
        let field = Field::builder("245", '1', '0')
            .subfield('c', "Author.")
            .subfield('a', "Title :")
            .subfield('b', "subtitle /")
            .build();

        assert_eq!(
            field.select_subfields(&['a', 'c']),
            vec!["Author.", "Title :"]
        );
        assert_eq!(field.select_subfields(&[]).len(), 3);
        assert!(field.select_subfields(&['z']).is_empty());
        assert_eq!(field.subfield_or_empty('z'), "");
    }
}
