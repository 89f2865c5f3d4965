mod common;

use common::FlamingoCsvBuilder;
use flamingo_uploader::convert::{convert_lines, convert_reader, stream_document};
use flamingo_uploader::document::CHANNEL_NAMES;
use flamingo_uploader::record::serial_number_from_line;
use flamingo_uploader::{Error, OutputRecord, SkipReason};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use tempfile::tempdir;

fn sample(timestamp: f64, temperature: f64, conductivity: f64, voltage: f64) -> OutputRecord {
    OutputRecord {
        timestamp,
        temperature,
        conductivity,
        voltage,
    }
}

// ============================================================================
// IN-MEMORY CONVERSION
// ============================================================================

#[test]
fn test_reference_line_accepted_with_matching_checksum() {
    let result = convert_lines(["a,b,2.5,SN,23.4,500,0,3.75,93"]).unwrap();
    assert_eq!(result.records, vec![sample(2.5, 23.4, 500.0, 3.75)]);
    assert!(result.skipped.is_empty());
}

#[test]
fn test_reference_line_rejected_with_other_checksum() {
    let result = convert_lines(["a,b,2.5,SN,23.4,500,0,3.75,129"]).unwrap();
    assert!(result.records.is_empty());
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].reason, SkipReason::InvalidChecksum);
    assert_eq!(result.skipped[0].reason.to_string(), "invalid checksum");
    assert_eq!(result.skipped[0].line, "a,b,2.5,SN,23.4,500,0,3.75,129");
}

#[test]
fn test_short_lines_always_wrong_field_count() {
    let lines = [
        "",
        "just one field",
        "a,b,2.5,SN,23.4,500,0,3.75",
        "a,b,2.5,SN,23.4,500,0",
    ];
    let result = convert_lines(lines).unwrap();
    assert!(result.records.is_empty());
    assert_eq!(result.skipped.len(), 4);
    assert!(result
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::WrongFieldCount));
}

#[test]
fn test_mixed_file_keeps_only_valid_line() {
    let builder = FlamingoCsvBuilder::new()
        .raw("a,b,1,SN,20,300,0")
        .errored(2.0, 1)
        .valid(3.0, 21.7, 455.0, 3.62);

    let result = convert_lines(builder.lines()).unwrap();

    assert_eq!(result.records, vec![sample(3.0, 21.7, 455.0, 3.62)]);
    let reasons: Vec<SkipReason> = result.skipped.iter().map(|s| s.reason).collect();
    assert_eq!(
        reasons,
        vec![SkipReason::WrongFieldCount, SkipReason::NonZeroErrorCode]
    );
    assert_eq!(result.lines_read(), 3);
}

#[test]
fn test_accepted_records_keep_input_order() {
    let mut builder = FlamingoCsvBuilder::new();
    for i in 0..50 {
        let t = 1_450_000_000.0 + f64::from(i) * 60.0;
        builder = builder.valid(t, 15.0 + f64::from(i % 10) / 10.0, 400.0 + f64::from(i), 3.5);
        if i % 7 == 0 {
            builder = builder.bad_checksum(t + 1.0);
        }
    }

    let result = convert_lines(builder.lines()).unwrap();

    assert_eq!(result.records.len(), 50);
    let timestamps: Vec<f64> = result.records.iter().map(|r| r.timestamp).collect();
    let mut sorted = timestamps.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(timestamps, sorted);
    assert_eq!(result.skipped.len(), 8);
}

#[test]
fn test_whitespace_around_fields_is_ignored() {
    let result = convert_lines([" a , b , 2.5 , SN , 23.4 , 500 , 0 , 3.75 , 93 "]).unwrap();
    assert_eq!(result.records, vec![sample(2.5, 23.4, 500.0, 3.75)]);
}

#[test]
fn test_empty_input_is_fatal() {
    let lines: Vec<String> = Vec::new();
    assert!(matches!(convert_lines(lines), Err(Error::EmptyInput)));
    assert!(matches!(convert_reader(&b""[..]), Err(Error::EmptyInput)));
}

#[test]
fn test_reader_handles_crlf() {
    let input = "a,b,2.5,SN,23.4,500,0,3.75,93\r\na,b,3.5,SN,23.4,500,0,3.75,93\r\n";
    let result = convert_reader(input.as_bytes()).unwrap();
    assert_eq!(result.records.len(), 2);
    assert_eq!(result.records[1].timestamp, 3.5);
}

#[test]
fn test_invalid_utf8_line_does_not_abort_pass() {
    let mut input = b"a,b,1.5,SN,23.4,500,0,3.75,93\n".to_vec();
    input.extend_from_slice(b"a,b,\xff\xfe,SN,23.4,500,0,3.75,93\n");
    input.extend_from_slice(b"a,b,2.5,SN,23.4,500,0,3.75,94\n");
    input.extend_from_slice(b"a,b,3.5,SN,23.4,500,0,3.75,93\n");

    let result = convert_reader(&input[..]).unwrap();

    // The corrupt timestamp decodes to replacement characters and parses as
    // NaN; the checksum does not cover it, so the record is still accepted.
    assert_eq!(result.records.len(), 3);
    assert_eq!(result.records[0].timestamp, 1.5);
    assert!(result.records[1].timestamp.is_nan());
    assert_eq!(result.records[2].timestamp, 3.5);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].reason, SkipReason::InvalidChecksum);

    let (bytes, summary) = stream_document(&input[..], Vec::new()).unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(summary.accepted, 3);
    assert_eq!(summary.skipped, 1);
    assert_eq!(doc["data"][1], json!([null, 23.4, 500, 3.75]));
}

#[test]
fn test_reader_handles_cr_only_line_endings() {
    let input = "a,b,1,SN,23.4,500,0,3.75,93\ra,b,2,SN,23.4,500,0,3.75,93\ra,b,3,SN,23.4,500,0,3.75,93\r";

    let result = convert_reader(input.as_bytes()).unwrap();
    assert_eq!(result.records.len(), 3);
    assert!(result.skipped.is_empty());
    let timestamps: Vec<f64> = result.records.iter().map(|r| r.timestamp).collect();
    assert_eq!(timestamps, vec![1.0, 2.0, 3.0]);

    let (_, summary) = stream_document(input.as_bytes(), Vec::new()).unwrap();
    assert_eq!(summary.lines_read, 3);
    assert_eq!(summary.accepted, 3);
}

// ============================================================================
// STREAMED DOCUMENT
// ============================================================================

#[test]
fn test_stream_document_shape() {
    let csv = FlamingoCsvBuilder::new()
        .raw("a,b,c,d,e,f,g")
        .errored(1.0, 3)
        .valid(2.5, 23.4, 500.0, 3.75)
        .build();

    let (bytes, summary) = stream_document(csv.as_bytes(), Vec::new()).unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(doc["channel_names"], json!(CHANNEL_NAMES));
    assert_eq!(doc["channel_names"], json!(["temperature", "conductivity", "voltage"]));
    assert_eq!(doc["data"], json!([[2.5, 23.4, 500, 3.75]]));
    assert_eq!(summary.lines_read, 3);
    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.skipped, 2);
}

#[test]
fn test_stream_document_with_no_accepted_records() {
    let csv = FlamingoCsvBuilder::new().bad_checksum(1.0).errored(2.0, 4).build();

    let (bytes, summary) = stream_document(csv.as_bytes(), Vec::new()).unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(doc["data"], json!([]));
    assert_eq!(summary.accepted, 0);
}

#[test]
fn test_stream_document_from_empty_file_fails() {
    let result = stream_document(&b""[..], Vec::new());
    assert!(matches!(result, Err(Error::EmptyInput)));
}

#[test]
fn test_stream_document_to_file_matches_in_memory() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("flamingo.csv");
    let json_path = dir.path().join("upload.json");

    let builder = FlamingoCsvBuilder::new()
        .valid(1_450_000_000.0, 18.2, 512.0, 3.81)
        .bad_checksum(1_450_000_060.0)
        .valid(1_450_000_120.0, 18.3, 515.0, 3.8);
    File::create(&csv_path)
        .unwrap()
        .write_all(builder.build().as_bytes())
        .unwrap();

    let input = BufReader::new(File::open(&csv_path).unwrap());
    let output = BufWriter::new(File::create(&json_path).unwrap());
    let (_, summary) = stream_document(input, output).unwrap();
    assert_eq!(summary.summary(), "3 lines read, 2 records accepted, 1 lines skipped");

    let streamed: Value = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    let in_memory = convert_reader(BufReader::new(File::open(&csv_path).unwrap())).unwrap();

    let data = streamed["data"].as_array().unwrap();
    assert_eq!(data.len(), in_memory.records.len());
    for (row, record) in data.iter().zip(&in_memory.records) {
        let values: Vec<f64> = row.as_array().unwrap().iter().map(|v| v.as_f64().unwrap()).collect();
        assert_eq!(values, record.values().to_vec());
    }
}

// ============================================================================
// SERIAL NUMBER PEEK
// ============================================================================

#[test]
fn test_serial_number_uses_same_layout() {
    let csv = FlamingoCsvBuilder::new()
        .serial("FLAM-0099")
        .valid(1.0, 20.0, 300.0, 3.3)
        .build();
    let first = csv.lines().next().unwrap();
    assert_eq!(serial_number_from_line(first).unwrap(), "FLAM-0099");
}
