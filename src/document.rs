//! Normalized documents published to the search index.
//!
//! A [`Document`] is built fresh for each record by
//! [`crate::mapper::RecordMapper`] and is never modified after it is queued.
//! Empty optional fields are left out of the serialized JSON.

use serde::{Deserialize, Serialize};

/// The normalized form of one bibliographic record.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub identifier: String,
    pub source: String,
    pub source_link: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_titles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub creators: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<Contributor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub isbns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dois: Vec<String>,
    #[serde(default, rename = "oclcs", skip_serializing_if = "Vec::is_empty")]
    pub oclc_numbers: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lccn: String,
    #[serde(default, rename = "country_of_publication", skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub publication_date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub call_numbers: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub edition: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imprint: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub physical_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub publication_frequency: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub numbering: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub literary_form: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_place: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_bibliography: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_items: Vec<RelatedItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holdings: Vec<Holding>,
}

/// A contributor and the role the ruleset assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    /// Role, taken from the rule's field `kind`
    pub kind: String,
    /// Extracted names
    pub value: Vec<String>,
}

/// A related work and the kind of relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedItem {
    /// Relation, taken from the rule's field `kind`
    pub kind: String,
    /// Extracted descriptions
    pub value: Vec<String>,
}

/// Electronic access to the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Materials specified; "unknown" when the record gives none
    pub kind: String,
    /// Display text
    pub text: String,
    /// Target URL
    pub url: String,
    /// Access restriction note
    pub restrictions: String,
}

/// A physical copy and where to find it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Library name
    pub location: String,
    /// Collection name within the library
    pub collection: String,
    /// Shelf call number
    pub call_number: String,
    /// Holdings summary statement
    pub summary: String,
    /// Public note
    pub notes: String,
    /// Physical format
    pub format: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fields_are_omitted() {
        let doc = Document {
            identifier: "990001".to_string(),
            title: "A title".to_string(),
            languages: vec!["English".to_string()],
            ..Document::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object["title"], "A title");
        assert_eq!(object["languages"][0], "English");
        assert!(object.contains_key("source_link"));
        assert!(!object.contains_key("creators"));
        assert!(!object.contains_key("country_of_publication"));
        assert!(!object.contains_key("holdings"));
    }

    #[test]
    fn test_renamed_fields() {
        let doc = Document {
            oclc_numbers: vec!["123".to_string()],
            country: "France".to_string(),
            ..Document::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["oclcs"][0], "123");
        assert_eq!(json["country_of_publication"], "France");
    }
}
