//! Tests for reassembling JSON documents from fragmented stdout.

use claude_stream::cli::{decode_stream, DecodeError, StreamDecoder, MAX_BUFFER_SIZE};
use futures_util::StreamExt;
use proptest::prelude::*;
use serde_json::Value;

const TRANSCRIPT: &str = concat!(
    r#"{"type":"system","subtype":"init","session_id":"s1","model":"m"}"#,
    "\n",
    r#"{"type":"assistant","message":{"content":[{"type":"text","text":"line\nbreak"}]}}"#,
    "\n\n",
    r#"{"type":"result","subtype":"success","duration_ms":5,"duration_api_ms":4,"is_error":false,"num_turns":1,"session_id":"s1"}"#,
    "\n",
);

async fn collect<R>(reader: R) -> Vec<Result<Value, DecodeError>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    decode_stream(reader).collect().await
}

#[tokio::test]
async fn reads_documents_across_fragmented_reads() {
    let bytes = TRANSCRIPT.as_bytes();
    let reader = tokio_test::io::Builder::new()
        .read(&bytes[..7])
        .read(&bytes[7..90])
        .read(&bytes[90..])
        .build();

    let items = collect(reader).await;
    assert_eq!(items.len(), 3);
    let docs: Vec<Value> = items.into_iter().map(Result::unwrap).collect();
    assert_eq!(docs[0]["subtype"], "init");
    assert_eq!(
        docs[1]["message"]["content"][0]["text"],
        "line\nbreak",
        "escaped newline must survive reassembly"
    );
    assert_eq!(docs[2]["type"], "result");
}

#[tokio::test]
async fn incomplete_tail_is_dropped_at_eof() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"type\":\"user\",\"message\":{\"content\":\"a\"}}\n")
        .read(b"{\"type\":\"assist")
        .build();

    let items = collect(reader).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_ref().unwrap()["type"], "user");
}

#[tokio::test]
async fn oversized_document_ends_stream_with_overflow() {
    let mut output = b"{\"type\":\"system\",\"subtype\":\"init\"}\n".to_vec();
    output.extend_from_slice(b"{\"type\":\"assistant\",\"data\":\"");
    output.extend(std::iter::repeat(b'x').take(MAX_BUFFER_SIZE));

    let items = collect(output.as_slice()).await;
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(matches!(items[1], Err(DecodeError::Overflow { .. })));
}

#[tokio::test]
async fn read_error_ends_stream() {
    let reader = tokio_test::io::Builder::new()
        .read(b"{\"a\":1}\n")
        .read_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        .build();

    let items = collect(reader).await;
    assert_eq!(items.len(), 2);
    assert!(matches!(items[1], Err(DecodeError::Io(_))));
}

fn decode_in_chunks(bytes: &[u8], sizes: &[usize]) -> Vec<Value> {
    let mut decoder = StreamDecoder::new();
    let mut out = Vec::new();
    let mut rest = bytes;
    let mut sizes = sizes.iter().cycle();
    while !rest.is_empty() {
        let take = (*sizes.next().unwrap_or(&1)).clamp(1, rest.len());
        let (chunk, tail) = rest.split_at(take);
        decoder.feed(chunk, &mut out).unwrap();
        rest = tail;
    }
    out
}

proptest! {
    #[test]
    fn rechunking_never_changes_the_output(sizes in prop::collection::vec(1usize..64, 1..16)) {
        let whole = decode_in_chunks(TRANSCRIPT.as_bytes(), &[TRANSCRIPT.len()]);
        let split = decode_in_chunks(TRANSCRIPT.as_bytes(), &sizes);
        prop_assert_eq!(whole.len(), 3);
        prop_assert_eq!(split, whole);
    }
}
