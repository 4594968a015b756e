//! Reading ISO 2709 records from byte streams.
//!
//! [`MarcReader`] frames the input on the record terminator (0x1D) before
//! decoding, so a record with a corrupt leader, directory, or field does not
//! desynchronize the stream: the reader reports the error and the next call
//! starts cleanly at the following record.
//!
//! ```
//! use mrrc_ingest::MarcReader;
//! use std::io::Cursor;
//!
//! let mut reader = MarcReader::new(Cursor::new(Vec::new()));
//! assert!(reader.read_record().unwrap().is_none());
//! ```

use crate::error::{IngestError, Result};
use crate::leader::{Leader, LEADER_LEN};
use crate::record::{is_control_tag, Field, Record};
use std::io::{BufRead, BufReader, Read};

const RECORD_TERMINATOR: u8 = 0x1D;
const FIELD_TERMINATOR: u8 = 0x1E;
const SUBFIELD_DELIMITER: u8 = 0x1F;
const DIRECTORY_ENTRY_LEN: usize = 12;

/// Reader for ISO 2709 binary records.
///
/// Also usable as an [`Iterator`] of `Result<Record>`: decode errors are
/// yielded in place and iteration continues; an I/O error is yielded once
/// and ends iteration.
#[derive(Debug)]
pub struct MarcReader<R: Read> {
    reader: BufReader<R>,
    buffer: Vec<u8>,
    records_read: usize,
    finished: bool,
}

impl<R: Read> MarcReader<R> {
    /// Create a new reader over any byte source.
    pub fn new(reader: R) -> Self {
        MarcReader {
            reader: BufReader::new(reader),
            buffer: Vec::with_capacity(4096),
            records_read: 0,
            finished: false,
        }
    }

    /// Number of records framed so far, including ones that failed to decode.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Read and decode the next record.
    ///
    /// Returns `Ok(None)` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns a decode error (see [`IngestError::is_decode_error`]) for a
    /// malformed record, after which reading can continue, or
    /// [`IngestError::Io`] if the underlying source fails.
    pub fn read_record(&mut self) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }

        self.buffer.clear();
        let n = self.reader.read_until(RECORD_TERMINATOR, &mut self.buffer)?;
        if n == 0 || self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.finished = true;
            return Ok(None);
        }

        self.records_read += 1;
        if self.buffer.last() != Some(&RECORD_TERMINATOR) {
            self.finished = true;
            return Err(IngestError::TruncatedRecord(format!(
                "Stream ended inside record {} after {} bytes",
                self.records_read,
                self.buffer.len()
            )));
        }

        decode_record(&self.buffer).map(Some)
    }
}

impl<R: Read> Iterator for MarcReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e @ IngestError::Io(_)) => {
                self.finished = true;
                Some(Err(e))
            },
            Err(e) => Some(Err(e)),
        }
    }
}

/// Decode one framed record, terminator included.
///
/// # Errors
///
/// Returns a decode error describing the first structural problem found.
pub fn decode_record(bytes: &[u8]) -> Result<Record> {
    let leader = Leader::from_bytes(bytes)?;
    leader.validate_for_reading()?;

    let record_length = leader.record_length as usize;
    if bytes.len() < record_length {
        return Err(IngestError::TruncatedRecord(format!(
            "Leader declares {record_length} bytes, found {}",
            bytes.len()
        )));
    }

    let base_address = leader.data_base_address as usize;
    let directory = &bytes[LEADER_LEN..base_address];
    let data = &bytes[base_address..];

    let mut record = Record::new(leader);

    for entry in directory.chunks(DIRECTORY_ENTRY_LEN) {
        if entry[0] == FIELD_TERMINATOR {
            break;
        }
        if entry.len() < DIRECTORY_ENTRY_LEN {
            return Err(IngestError::InvalidRecord(
                "Incomplete directory entry".to_string(),
            ));
        }

        let tag = String::from_utf8_lossy(&entry[0..3]).to_string();
        let length = parse_number(&entry[3..7])?;
        let start = parse_number(&entry[7..12])?;
        let field_data = data.get(start..start + length).ok_or_else(|| {
            IngestError::InvalidRecord(format!("Field {tag} exceeds data area"))
        })?;

        if is_control_tag(&tag) {
            let value = trim_terminator(field_data);
            record.add_control_field(tag, String::from_utf8_lossy(value).to_string());
        } else {
            let field = parse_data_field(field_data, tag)?;
            record.add_field(field);
        }
    }

    Ok(record)
}

fn trim_terminator(data: &[u8]) -> &[u8] {
    match data.last() {
        Some(&FIELD_TERMINATOR) => &data[..data.len() - 1],
        _ => data,
    }
}

/// Parse a data field from raw bytes
fn parse_data_field(data: &[u8], tag: String) -> Result<Field> {
    if data.len() < 2 {
        return Err(IngestError::InvalidField(format!(
            "Tag {tag}: data field too short (needs indicators)"
        )));
    }

    let mut field = Field::new(tag, data[0] as char, data[1] as char);
    let mut rest = trim_terminator(&data[2..]);

    while let Some((&first, tail)) = rest.split_first() {
        if first != SUBFIELD_DELIMITER {
            return Err(IngestError::InvalidField(format!(
                "Tag {}: expected subfield delimiter",
                field.tag
            )));
        }
        let Some((&code, tail)) = tail.split_first() else {
            break;
        };
        let end = memchr::memchr(SUBFIELD_DELIMITER, tail).unwrap_or(tail.len());
        field.add_subfield(
            code as char,
            String::from_utf8_lossy(&tail[..end]).to_string(),
        );
        rest = &tail[end..];
    }

    Ok(field)
}

/// Parse a fixed-width ASCII number from a directory entry
fn parse_number(bytes: &[u8]) -> Result<usize> {
    bytes.iter().try_fold(0usize, |acc, &byte| {
        if byte.is_ascii_digit() {
            Ok(acc * 10 + usize::from(byte - b'0'))
        } else {
            Err(IngestError::InvalidRecord(format!(
                "Invalid numeric field: expected digits, got byte {}",
                byte as char
            )))
        }
    })
}
