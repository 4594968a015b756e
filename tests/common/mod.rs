//! Common test helpers shared across the integration suite.

#![allow(dead_code)]

use mrrc_ingest::{CodeTable, MappingContext, RecordMapper, Ruleset};
use std::path::PathBuf;
use std::sync::Arc;

pub const FIELD_TERMINATOR: u8 = 0x1E;
pub const RECORD_TERMINATOR: u8 = 0x1D;
pub const SUBFIELD_DELIMITER: u8 = 0x1F;

/// Fixed-length data for an English-language nonfiction book printed in
/// New York in 1985.
pub const BOOK_008: &str = "850101s1985    nyu           000 0 eng d";

/// Path of a file shipped in the repository's `config/` directory.
pub fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join(name)
}

/// Mapper built from the shipped ruleset and code tables.
pub fn shipped_mapper() -> Arc<RecordMapper> {
    let context = MappingContext {
        ruleset: Ruleset::from_path(config_path("marc_rules.json")).expect("shipped ruleset"),
        languages: CodeTable::from_path(config_path("languages.xml"), "language")
            .expect("shipped language codes"),
        countries: CodeTable::from_path(config_path("countries.xml"), "country")
            .expect("shipped country codes"),
        source_name: "Test Catalog".to_string(),
        source_link_base: "https://catalog.example/item/".to_string(),
    };
    Arc::new(RecordMapper::new(context).expect("shipped ruleset defines every label"))
}

/// Body of a data field: two indicators then each subfield.
pub fn data_field(indicator1: char, indicator2: char, subfields: &[(char, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.push(indicator1 as u8);
    body.push(indicator2 as u8);
    for (code, value) in subfields {
        body.push(SUBFIELD_DELIMITER);
        body.push(*code as u8);
        body.extend_from_slice(value.as_bytes());
    }
    body
}

/// Body of a control field.
pub fn control_field(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// Encode one ISO 2709 record from `(tag, body)` pairs.
pub fn encode_record(record_type: u8, fields: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut directory = Vec::new();
    let mut data = Vec::new();
    for (tag, body) in fields {
        let start = data.len();
        data.extend_from_slice(body);
        data.push(FIELD_TERMINATOR);
        directory.extend_from_slice(tag.as_bytes());
        directory.extend_from_slice(format!("{:04}", data.len() - start).as_bytes());
        directory.extend_from_slice(format!("{start:05}").as_bytes());
    }
    directory.push(FIELD_TERMINATOR);

    let base_address = 24 + directory.len();
    let record_length = base_address + data.len() + 1;
    let mut out = format!("{record_length:05}n").into_bytes();
    out.push(record_type);
    out.extend_from_slice(format!("m a22{base_address:05} a 4500").as_bytes());
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data);
    out.push(RECORD_TERMINATOR);
    out
}

/// A minimal book with an identifier, fixed data, and a title.
pub fn book(id: &str, title: &str) -> Vec<u8> {
    encode_record(
        b'a',
        &[
            ("001", control_field(id)),
            ("008", control_field(BOOK_008)),
            ("245", data_field('1', '0', &[('a', title)])),
        ],
    )
}

/// A record that decodes but has no title.
pub fn untitled(id: &str) -> Vec<u8> {
    encode_record(
        b'a',
        &[
            ("001", control_field(id)),
            ("008", control_field(BOOK_008)),
            ("500", data_field(' ', ' ', &[('a', "A note")])),
        ],
    )
}

/// A record-sized chunk whose leader cannot be decoded.
pub fn garbage() -> Vec<u8> {
    let mut bytes = b"not a marc leader at all, just noise".to_vec();
    bytes.push(RECORD_TERMINATOR);
    bytes
}

/// Concatenate record chunks into one stream.
pub fn stream(records: &[Vec<u8>]) -> Vec<u8> {
    records.concat()
}
