//! Record to document mapping.
//!
//! [`RecordMapper`] applies the ruleset, the code tables, and the fixed
//! lookup tables to one decoded [`Record`] to produce one [`Document`].
//!
//! Two steps are ordered: a record without a title is rejected before any
//! other field is extracted, and holdings fall back from the `866` family to
//! the `852` family only when `866` yields nothing. Every other field is
//! extracted independently.

use crate::codes::{translate, CodeTable, FILL_CHARACTERS};
use crate::document::{Contributor, Document, Holding, Link, RelatedItem};
use crate::error::{IngestError, Result};
use crate::lookup;
use crate::record::{Field, Record};
use crate::rules::Ruleset;

/// Rule labels the mapper reads. A ruleset must define all of them.
pub const REQUIRED_LABELS: &[&str] = &[
    "oclc_number",
    "lccn",
    "title",
    "alternate_titles",
    "creators",
    "contributors",
    "related_place",
    "related_items",
    "in_bibliography",
    "subjects",
    "isbns",
    "issns",
    "dois",
    "place_of_publication",
    "languages",
    "call_numbers",
    "edition",
    "imprint",
    "physical_description",
    "publication_frequency",
    "publication_date",
    "numbering",
    "notes",
    "contents",
    "summary",
    "literary_form",
];

const LINK_TAG: &str = "856";
const DEFAULT_LINK_KIND: &str = "unknown";

/// Subfield layout of one holdings tag family.
#[derive(Debug, Clone, Copy)]
struct HoldingsFamily {
    tag: &'static str,
    location: char,
    collection: char,
    call_number: char,
    summary: char,
    notes: char,
    /// Format code subfield; `None` means every holding is a print volume
    format: Option<char>,
}

const TEXTUAL_HOLDINGS: HoldingsFamily = HoldingsFamily {
    tag: "866",
    location: 'b',
    collection: 'c',
    call_number: 'h',
    summary: 'a',
    notes: 'z',
    format: None,
};

const LOCATION_HOLDINGS: HoldingsFamily = HoldingsFamily {
    tag: "852",
    location: 'b',
    collection: 'c',
    call_number: 'h',
    summary: 'a',
    notes: 'z',
    format: Some('k'),
};

/// Read-only inputs shared by every mapping in a run.
#[derive(Debug, Clone)]
pub struct MappingContext {
    /// Extraction rules
    pub ruleset: Ruleset,
    /// Language code table
    pub languages: CodeTable,
    /// Country code table
    pub countries: CodeTable,
    /// Value of every document's `source`
    pub source_name: String,
    /// Prefix joined with the identifier to form `source_link`
    pub source_link_base: String,
}

/// Builds one [`Document`] per record.
#[derive(Debug, Clone)]
pub struct RecordMapper {
    context: MappingContext,
}

impl RecordMapper {
    /// Create a mapper, checking the ruleset defines every required label.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] naming the missing labels.
    pub fn new(context: MappingContext) -> Result<Self> {
        context.ruleset.require(REQUIRED_LABELS)?;
        Ok(RecordMapper { context })
    }

    /// The shared mapping inputs.
    #[must_use]
    pub fn context(&self) -> &MappingContext {
        &self.context
    }

    /// Map one record.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::MissingTitle`] when the title rule matches
    /// nothing, or [`IngestError::FieldExtraction`] when a byte range does
    /// not fit a value.
    pub fn map(&self, record: &Record) -> Result<Document> {
        let ctx = &self.context;
        let identifier = record.control_number().unwrap_or_default().to_string();

        let title = self
            .first(record, "title")?
            .ok_or_else(|| IngestError::MissingTitle(identifier.clone()))?;

        let mut doc = Document {
            source: ctx.source_name.clone(),
            source_link: if identifier.is_empty() {
                String::new()
            } else {
                format!("{}{identifier}", ctx.source_link_base)
            },
            identifier,
            title,
            ..Document::default()
        };

        doc.oclc_numbers = self.all(record, "oclc_number")?;
        doc.lccn = self
            .first(record, "lccn")?
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        doc.alternate_titles = self.all(record, "alternate_titles")?;
        doc.creators = self.all(record, "creators")?;
        doc.contributors = self
            .kinded(record, "contributors")?
            .into_iter()
            .map(|(kind, value)| Contributor { kind, value })
            .collect();
        doc.related_place = self.all(record, "related_place")?;
        doc.related_items = self
            .kinded(record, "related_items")?
            .into_iter()
            .map(|(kind, value)| RelatedItem { kind, value })
            .collect();
        doc.in_bibliography = self.all(record, "in_bibliography")?;
        doc.subjects = self.all(record, "subjects")?;
        doc.isbns = self.all(record, "isbns")?;
        doc.issns = self.all(record, "issns")?;
        doc.dois = self.all(record, "dois")?;

        if let Some(country) = self.first(record, "place_of_publication")? {
            let country = country.trim_matches(FILL_CHARACTERS);
            doc.country = translate(&[country], &ctx.countries)
                .pop()
                .unwrap_or_default();
        }
        doc.languages = translate(&self.all(record, "languages")?, &ctx.languages);

        doc.call_numbers = self.all(record, "call_numbers")?;
        doc.edition = self.first(record, "edition")?.unwrap_or_default();
        doc.imprint = self.all(record, "imprint")?;
        doc.physical_description = self
            .first(record, "physical_description")?
            .unwrap_or_default();
        doc.publication_frequency = self.all(record, "publication_frequency")?;
        doc.publication_date = self.first(record, "publication_date")?.unwrap_or_default();
        doc.numbering = self.first(record, "numbering")?.unwrap_or_default();
        doc.notes = self.all(record, "notes")?;
        doc.contents = self.all(record, "contents")?;
        doc.summary = self.all(record, "summary")?;

        doc.content_type = lookup::content_type(record.leader.byte(6).unwrap_or(b' ')).to_string();
        doc.literary_form =
            lookup::literary_form(self.first(record, "literary_form")?.as_deref()).to_string();

        doc.links = links(record);
        doc.holdings = holdings(record);
        for holding in &doc.holdings {
            if !holding.format.is_empty() && !doc.format.contains(&holding.format) {
                doc.format.push(holding.format.clone());
            }
        }

        Ok(doc)
    }

    fn all(&self, record: &Record, label: &str) -> Result<Vec<String>> {
        self.context.ruleset.apply_rule(record, label)
    }

    fn first(&self, record: &Record, label: &str) -> Result<Option<String>> {
        Ok(self.all(record, label)?.into_iter().next())
    }

    /// One `(kind, values)` entry per field spec that matched anything.
    fn kinded(&self, record: &Record, label: &str) -> Result<Vec<(String, Vec<String>)>> {
        let mut out = Vec::new();
        for spec in &self.context.ruleset.get(label)?.fields {
            let values = spec.extract(record)?;
            if !values.is_empty() {
                out.push((spec.kind.clone().unwrap_or_default(), values));
            }
        }
        Ok(out)
    }
}

/// Electronic locations with first indicator 4 and second indicator 0 or 1.
fn links(record: &Record) -> Vec<Link> {
    record
        .fields_by_tag(LINK_TAG)
        .filter(|f| f.indicator1 == '4' && matches!(f.indicator2, '0' | '1'))
        .map(|f| {
            let kind = f.subfield_or_empty('3');
            Link {
                kind: if kind.is_empty() {
                    DEFAULT_LINK_KIND.to_string()
                } else {
                    kind.to_string()
                },
                text: f.subfield_or_empty('y').to_string(),
                url: f.subfield_or_empty('u').to_string(),
                restrictions: f.subfield_or_empty('z').to_string(),
            }
        })
        .collect()
}

/// Holdings from the textual family, or the location family if there are none.
fn holdings(record: &Record) -> Vec<Holding> {
    let primary = holdings_for(record, TEXTUAL_HOLDINGS);
    if primary.is_empty() {
        holdings_for(record, LOCATION_HOLDINGS)
    } else {
        primary
    }
}

fn holdings_for(record: &Record, family: HoldingsFamily) -> Vec<Holding> {
    record
        .fields_by_tag(family.tag)
        .map(|f| holding(f, family))
        .collect()
}

fn holding(field: &Field, family: HoldingsFamily) -> Holding {
    let site = field.subfield_or_empty(family.location);
    let location = lookup::location(site);
    let format = match family.format {
        None => lookup::PRINT_VOLUME.to_string(),
        Some(code) => lookup::format(&location, field.subfield_or_empty(code)),
    };
    Holding {
        collection: lookup::collection(field.subfield_or_empty(family.collection), site),
        call_number: field.subfield_or_empty(family.call_number).to_string(),
        summary: field.subfield_or_empty(family.summary).to_string(),
        notes: field.subfield_or_empty(family.notes).to_string(),
        location,
        format,
    }
}
