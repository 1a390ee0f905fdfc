//! Frame reassembly property tests.
//!
//! For any event-record text and any way of partitioning its bytes into
//! chunks, the reader must emit the record exactly once, byte-identical.

use platewise::sse::{decode_record, FrameReader};

const RECORD: &str =
    "event: scan\ndata: {\"id\":\"s1\",\"state\":\"analyzing\",\"product_info\":{\"name\":\"Soda\"}}";

fn feed_in_chunks(input: &[u8], splits: &[usize]) -> Vec<String> {
    let mut reader = FrameReader::new();
    let mut records = Vec::new();
    let mut start = 0;
    for &end in splits {
        records.extend(reader.feed(&input[start..end]));
        start = end;
    }
    records.extend(reader.feed(&input[start..]));
    if let Some(rest) = reader.finish() {
        records.push(rest);
    }
    records
}

#[test]
fn reassembly_is_chunking_independent_for_all_two_way_splits() {
    let input = format!("{}\n\n", RECORD).into_bytes();
    for split in 0..=input.len() {
        let records = feed_in_chunks(&input, &[split]);
        assert_eq!(records, vec![RECORD.to_string()], "failed at split {}", split);
    }
}

#[test]
fn reassembly_survives_five_chunk_partition() {
    // Scenario: the analyzing snapshot split into 5 arbitrary byte chunks
    let input = format!("{}\n\n", RECORD).into_bytes();
    let n = input.len();
    let splits = [n / 7, n / 3, n / 2, (n * 4) / 5];
    let records = feed_in_chunks(&input, &splits);
    assert_eq!(records, vec![RECORD.to_string()]);

    // And the reassembled record decodes to exactly one resolved event
    let raw = decode_record(&records[0]).expect("record should decode");
    assert_eq!(raw.event_type, "scan");
    let payload: serde_json::Value = serde_json::from_str(&raw.data).unwrap();
    assert_eq!(payload["state"], "analyzing");
}

#[test]
fn reassembly_byte_by_byte_matches_single_chunk() {
    let input = format!("{}\n\n{}\n\n", RECORD, "event: done").into_bytes();

    let single = feed_in_chunks(&input, &[]);
    let splits: Vec<usize> = (1..input.len()).collect();
    let bytewise = feed_in_chunks(&input, &splits);

    assert_eq!(single, bytewise);
    assert_eq!(single.len(), 2);
}

#[test]
fn trailing_record_without_separator_is_emitted_on_finish() {
    let input = format!("{}\n\nevent: done", RECORD).into_bytes();
    let records = feed_in_chunks(&input, &[10]);
    assert_eq!(
        records,
        vec![RECORD.to_string(), "event: done".to_string()]
    );
}

#[test]
fn crlf_framed_stream_reassembles() {
    let input = b"event: scan\r\ndata: {\"id\":\"s1\",\"state\":\"done\"}\r\n\r\n".to_vec();
    for split in 0..=input.len() {
        let records = feed_in_chunks(&input, &[split]);
        assert_eq!(records.len(), 1, "failed at split {}", split);
        let raw = decode_record(&records[0]).unwrap();
        assert_eq!(raw.event_type, "scan");
    }
}
