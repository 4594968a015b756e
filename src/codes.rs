//! Code tables for language and country codes.
//!
//! Tables are read from XML code lists where each entry element holds a
//! `name` and a `code`:
//!
//! ```xml
//! <codelist>
//!   <languages>
//!     <language><name authorized="yes">English</name><code>eng</code></language>
//!   </languages>
//! </codelist>
//! ```
//!
//! A table is loaded once per run and only read afterwards.

use crate::error::{IngestError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Fill characters that pad short codes inside fixed-length fields.
pub const FILL_CHARACTERS: &[char] = &[' ', '|'];

/// Mapping from short code to display name.
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    names: HashMap<String, String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Name,
    Code,
}

impl CodeTable {
    /// Build a table from `(code, name)` pairs.
    pub fn from_pairs<I, C, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        CodeTable {
            names: pairs
                .into_iter()
                .map(|(c, n)| (c.into(), n.into()))
                .collect(),
        }
    }

    /// Parse an XML code list whose entries are `<element>` elements.
    ///
    /// Only the first `name` inside an entry is used. Entries lacking a code
    /// or a name are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] for malformed XML.
    pub fn from_xml_str(xml: &str, element: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut names = HashMap::new();
        let mut in_entry = false;
        let mut capture = Capture::None;
        let mut name: Option<String> = None;
        let mut code: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    tag if tag == element.as_bytes() => {
                        in_entry = true;
                        name = None;
                        code = None;
                    },
                    b"name" if in_entry && name.is_none() => capture = Capture::Name,
                    b"code" if in_entry && code.is_none() => capture = Capture::Code,
                    _ => capture = Capture::None,
                },
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| xml_error(&reader, &e))?;
                    match capture {
                        Capture::Name => name = Some(text.into_owned()),
                        Capture::Code => code = Some(text.into_owned()),
                        Capture::None => {},
                    }
                },
                Ok(Event::End(e)) => {
                    capture = Capture::None;
                    if e.local_name().as_ref() == element.as_bytes() {
                        if let (Some(c), Some(n)) = (code.take(), name.take()) {
                            names.insert(c, n);
                        }
                        in_entry = false;
                    }
                },
                Ok(Event::Eof) => break,
                Ok(_) => {},
                Err(e) => return Err(xml_error(&reader, &e)),
            }
        }

        Ok(CodeTable { names })
    }

    /// Read an XML code list from disk.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the file is unreadable or malformed.
    pub fn from_path(path: impl AsRef<Path>, element: &str) -> Result<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path).map_err(|e| {
            IngestError::Config(format!("Cannot read code table {}: {e}", path.display()))
        })?;
        Self::from_xml_str(&xml, element)
    }

    /// Display name for `code`.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    /// Number of codes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if the table holds no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn xml_error<B>(reader: &Reader<B>, e: &quick_xml::Error) -> IngestError {
    IngestError::Config(format!(
        "Malformed code table at byte {}: {e}",
        reader.buffer_position()
    ))
}

/// Translate each code to its display name.
///
/// One output per input, in order. Unknown codes pass through unchanged.
#[must_use]
pub fn translate<S: AsRef<str>>(codes: &[S], table: &CodeTable) -> Vec<String> {
    codes
        .iter()
        .map(|code| {
            let code = code.as_ref();
            table.lookup(code).unwrap_or(code).to_string()
        })
        .collect()
}
