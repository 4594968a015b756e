//! End-to-end ingest through the streamer, queue, and bulk indexer.

mod common;

use common::*;
use flate2::write::GzEncoder;
use flate2::Compression;
use mrrc_ingest::engine::{MemoryEngine, SearchEngine};
use mrrc_ingest::source::open_source;
use mrrc_ingest::{
    ingest, run_pipeline, IngestError, IngestRequest, JsonLinesSink, PipelineConfig, TitleSink,
};
use std::io::{Cursor, Write};

fn request(index: &str) -> IngestRequest {
    IngestRequest {
        index: Some(index.to_string()),
        prefix: "aleph".to_string(),
        auto_promote: false,
    }
}

#[test]
fn test_title_and_link_reach_the_index() {
    let bytes = encode_record(
        b'a',
        &[
            ("001", control_field("990001")),
            ("245", data_field('1', '0', &[('a', "Linked title")])),
            ("856", data_field('4', '0', &[('u', "http://x")])),
        ],
    );
    let engine = MemoryEngine::new();

    let report = ingest(
        Cursor::new(bytes),
        shipped_mapper(),
        &engine,
        &request("aleph-1"),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(report.indexed, 1);
    let docs = engine.documents("aleph-1");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].title, "Linked title");
    assert_eq!(docs[0].links.len(), 1);
    assert_eq!(docs[0].links[0].url, "http://x");
    assert_eq!(docs[0].links[0].kind, "unknown");
}

#[test]
fn test_shipped_rules_map_a_full_record() {
    let bytes = encode_record(
        b'a',
        &[
            ("001", control_field("990002")),
            ("008", control_field(BOOK_008)),
            ("020", data_field(' ', ' ', &[('a', "9780262033848")])),
            ("041", data_field('1', ' ', &[('a', "fre")])),
            ("100", data_field('1', ' ', &[('a', "Cormen, Thomas H.")])),
            (
                "245",
                data_field('1', '0', &[('a', "Introduction to algorithms /"), ('c', "Cormen")]),
            ),
            ("650", data_field(' ', '0', &[('a', "Computer programming.")])),
            ("700", data_field('1', ' ', &[('a', "Leiserson, Charles E.")])),
            (
                "866",
                data_field(' ', ' ', &[('b', "ENG"), ('c', "STACK"), ('h', "QA76.6 .I5858")]),
            ),
        ],
    );

    let engine = MemoryEngine::new();
    ingest(
        Cursor::new(bytes),
        shipped_mapper(),
        &engine,
        &request("aleph-1"),
        &PipelineConfig::default(),
    )
    .unwrap();

    let doc = &engine.documents("aleph-1")[0];
    assert_eq!(doc.identifier, "990002");
    assert_eq!(doc.source, "Test Catalog");
    assert_eq!(doc.source_link, "https://catalog.example/item/990002");
    assert_eq!(doc.title, "Introduction to algorithms /");
    assert_eq!(doc.creators, vec!["Cormen, Thomas H."]);
    assert_eq!(doc.contributors.len(), 1);
    assert_eq!(doc.contributors[0].kind, "contributor");
    assert_eq!(doc.isbns, vec!["9780262033848"]);
    assert_eq!(doc.languages, vec!["English", "French"]);
    assert_eq!(doc.country, "New York (State)");
    assert_eq!(doc.publication_date, "1985");
    assert_eq!(doc.content_type, "Text");
    assert_eq!(doc.literary_form, "nonfiction");
    assert_eq!(doc.holdings.len(), 1);
    assert_eq!(doc.holdings[0].location, "Barker Library");
    assert_eq!(doc.holdings[0].collection, "Stacks");
    assert_eq!(doc.format, vec!["Print volume"]);
}

#[test]
fn test_records_without_control_number_are_all_indexed() {
    let no_control_number = |title: &str| {
        encode_record(b'a', &[("245", data_field('1', '0', &[('a', title)]))])
    };
    let bytes = stream(&[no_control_number("First"), no_control_number("Second")]);
    let engine = MemoryEngine::new();

    let report = ingest(
        Cursor::new(bytes),
        shipped_mapper(),
        &engine,
        &request("aleph-1"),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(report.indexed, 2);
    let docs = engine.documents("aleph-1");
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].title, "First");
    assert_eq!(docs[1].title, "Second");
    assert!(docs.iter().all(|d| d.identifier.is_empty()));
    assert!(docs.iter().all(|d| d.source_link.is_empty()));
}

#[test]
fn test_bad_records_are_skipped() {
    let bytes = stream(&[
        book("1", "First"),
        garbage(),
        untitled("2"),
        book("3", "Third"),
    ]);
    let engine = MemoryEngine::new();

    let report = ingest(
        Cursor::new(bytes),
        shipped_mapper(),
        &engine,
        &request("aleph-1"),
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(report.indexed, 2);
    assert_eq!(report.stream.emitted, 2);
    assert_eq!(report.stream.skipped_decode, 1);
    assert_eq!(report.stream.skipped_mapping, 1);
    let titles: Vec<String> = engine
        .documents("aleph-1")
        .into_iter()
        .map(|d| d.title)
        .collect();
    assert_eq!(titles, vec!["First", "Third"]);
}

#[test]
fn test_small_queue_and_batches_lose_nothing() {
    let records: Vec<Vec<u8>> = (0..250)
        .map(|i| book(&format!("{i:06}"), &format!("Title {i}")))
        .collect();
    let config = PipelineConfig {
        queue_capacity: 2,
        batch_size: 7,
        max_consecutive_decode_errors: None,
    };
    let engine = MemoryEngine::new();

    let report = ingest(
        Cursor::new(stream(&records)),
        shipped_mapper(),
        &engine,
        &request("aleph-1"),
        &config,
    )
    .unwrap();

    assert_eq!(report.indexed, 250);
    let docs = engine.documents("aleph-1");
    assert_eq!(docs.len(), 250);
    assert_eq!(docs[0].identifier, "000000");
    assert_eq!(docs[249].identifier, "000249");
}

#[test]
fn test_consecutive_decode_errors_abort_when_limited() {
    let bytes = stream(&[
        book("1", "First"),
        garbage(),
        garbage(),
        garbage(),
        book("2", "Never reached"),
    ]);
    let config = PipelineConfig {
        max_consecutive_decode_errors: Some(3),
        ..PipelineConfig::default()
    };
    let engine = MemoryEngine::new();

    let err = ingest(
        Cursor::new(bytes),
        shipped_mapper(),
        &engine,
        &request("aleph-1"),
        &config,
    )
    .unwrap_err();

    assert!(matches!(err, IngestError::TooManyDecodeErrors(3)));
    // What was queued before the abort is still indexed.
    assert_eq!(engine.documents("aleph-1").len(), 1);
}

#[test]
fn test_interleaved_decode_errors_do_not_abort() {
    let bytes = stream(&[
        garbage(),
        garbage(),
        book("1", "First"),
        garbage(),
        garbage(),
        book("2", "Second"),
    ]);
    let config = PipelineConfig {
        max_consecutive_decode_errors: Some(3),
        ..PipelineConfig::default()
    };
    let engine = MemoryEngine::new();

    let report = ingest(
        Cursor::new(bytes),
        shipped_mapper(),
        &engine,
        &request("aleph-1"),
        &config,
    )
    .unwrap();
    assert_eq!(report.indexed, 2);
    assert_eq!(report.stream.skipped_decode, 4);
}

#[test]
fn test_bulk_rejection_stops_the_run_with_count() {
    let records: Vec<Vec<u8>> = (0..50)
        .map(|i| book(&i.to_string(), &format!("Title {i}")))
        .collect();
    let config = PipelineConfig {
        queue_capacity: 1,
        batch_size: 4,
        max_consecutive_decode_errors: None,
    };
    let engine = MemoryEngine::with_accept_limit(10);

    let err = ingest(
        Cursor::new(stream(&records)),
        shipped_mapper(),
        &engine,
        &request("aleph-1"),
        &config,
    )
    .unwrap_err();

    match err {
        IngestError::BulkWrite { indexed, .. } => assert_eq!(indexed, 10),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(engine.documents("aleph-1").len(), 10);
}

#[test]
fn test_auto_promote_points_alias_at_new_index() {
    let engine = MemoryEngine::new();
    let mut request = IngestRequest {
        index: None,
        prefix: "aleph".to_string(),
        auto_promote: true,
    };

    let first = ingest(
        Cursor::new(book("1", "First")),
        shipped_mapper(),
        &engine,
        &request,
        &PipelineConfig::default(),
    )
    .unwrap();
    assert!(first.promoted);
    assert!(first.index.starts_with("aleph-"));
    assert!(first.index.ends_with('z'));
    assert_eq!(engine.alias_targets("aleph").unwrap(), vec![first.index.clone()]);

    request.index = Some("aleph-next".to_string());
    let second = ingest(
        Cursor::new(book("2", "Second")),
        shipped_mapper(),
        &engine,
        &request,
        &PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(engine.alias_targets("aleph").unwrap(), vec!["aleph-next"]);
    assert!(engine.exists(&first.index).unwrap());
    assert_eq!(second.index, "aleph-next");
}

#[test]
fn test_failed_run_is_not_promoted() {
    let engine = MemoryEngine::with_accept_limit(0);
    let request = IngestRequest {
        index: Some("aleph-1".to_string()),
        prefix: "aleph".to_string(),
        auto_promote: true,
    };
    assert!(ingest(
        Cursor::new(book("1", "First")),
        shipped_mapper(),
        &engine,
        &request,
        &PipelineConfig::default(),
    )
    .is_err());
    assert!(engine.alias_targets("aleph").unwrap().is_empty());
}

#[test]
fn test_json_consumer_writes_each_document() {
    let bytes = stream(&[book("1", "First"), untitled("2"), book("3", "Third")]);
    let mut sink = JsonLinesSink::new(Vec::new());

    let report = run_pipeline(
        Cursor::new(bytes),
        shipped_mapper(),
        &mut sink,
        &PipelineConfig::default(),
    )
    .unwrap();
    assert_eq!(report.consumed, 2);

    let out = String::from_utf8(sink.into_inner()).unwrap();
    let ids: Vec<String> = out
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["identifier"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(ids, vec!["1", "3"]);
}

#[test]
fn test_gzip_source_is_decompressed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.mrc.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&stream(&[book("1", "First"), book("2", "Second")]))
        .unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let mut sink = TitleSink::new(Vec::new());
    let report = run_pipeline(
        open_source(path.to_str().unwrap()).unwrap(),
        shipped_mapper(),
        &mut sink,
        &PipelineConfig::default(),
    )
    .unwrap();

    assert_eq!(report.consumed, 2);
    assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "First\nSecond\n");
}
