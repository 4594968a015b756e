#![no_main]

use libfuzzer_sys::fuzz_target;
use mrrc_ingest::MarcReader;

// Malformed input must surface as per-record errors, never as a panic, and
// the reader must always reach the end of the stream.
fuzz_target!(|data: &[u8]| {
    let mut reader = MarcReader::new(data);
    let mut seen = 0usize;
    while let Some(result) = reader.next() {
        if let Ok(record) = result {
            let _ = record.control_number();
            for fields in record.fields.values() {
                for field in fields {
                    let _ = field.select_subfields(&[]);
                }
            }
        }
        seen += 1;
        assert!(seen <= data.len() + 1);
    }
});
