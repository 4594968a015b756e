//! Record source acquisition.
//!
//! Opens the byte stream the streamer decodes: a file path, `-` for standard
//! input, with transparent gzip decompression for paths ending in `.gz`.

use crate::error::{IngestError, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// A boxed byte stream that can be moved to the producer thread.
pub type RecordSource = Box<dyn Read + Send>;

/// Open `location` as a record source.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be opened, or
/// [`IngestError::Config`] for an empty location.
pub fn open_source(location: &str) -> Result<RecordSource> {
    if location.is_empty() {
        return Err(IngestError::Config(
            "No input file given for ingest".to_string(),
        ));
    }
    if location == "-" {
        return Ok(Box::new(io::stdin()));
    }

    let path = Path::new(location);
    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
