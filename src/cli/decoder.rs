//! Reassembly of JSON documents from Claude Code stdout.
//!
//! The CLI writes newline-delimited JSON, but reads from the pipe do not line
//! up with documents: one read can hold several documents, and one document
//! can span many reads. [`StreamDecoder`] accumulates fragments and emits each
//! document as soon as it parses.

use futures_core::Stream;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Largest partial document the decoder will hold before giving up.
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Size of each read from the underlying pipe.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Error type for decoding operations.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// The accumulator grew past its limit without completing a document.
    #[error("JSON message exceeded maximum buffer size of {limit} bytes")]
    Overflow { limit: usize },
    /// Reading from the underlying stream failed.
    #[error("Failed to read stdout: {0}")]
    Io(#[from] std::io::Error),
}

/// Incremental decoder for fragmented newline-delimited JSON.
#[derive(Debug)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    max_size: usize,
}

impl Default for StreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder {
    /// Create a decoder with the default 1 MiB limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_size(MAX_BUFFER_SIZE)
    }

    /// Create a decoder with a custom accumulator limit.
    #[must_use]
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_size,
        }
    }

    /// Number of bytes currently held for an incomplete document.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one chunk of raw output, pushing every completed document to `out`.
    ///
    /// Newlines are fragment separators and are not kept in the accumulator.
    /// Documents completed before an overflow are still pushed to `out`.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::Overflow` if appending a fragment would take the
    /// accumulator past its limit. The accumulator is cleared in that case.
    pub fn feed(&mut self, chunk: &[u8], out: &mut Vec<Value>) -> Result<(), DecodeError> {
        for fragment in chunk.split(|&b| b == b'\n') {
            if fragment.is_empty() {
                continue;
            }

            if self.buffer.len() + fragment.len() > self.max_size {
                self.buffer.clear();
                return Err(DecodeError::Overflow {
                    limit: self.max_size,
                });
            }

            self.buffer.extend_from_slice(fragment);
            self.drain_complete(out);
        }
        Ok(())
    }

    /// Discard whatever is left in the accumulator, returning its size.
    pub fn finish(&mut self) -> usize {
        let leftover = self.buffer.len();
        self.buffer.clear();
        leftover
    }

    /// Emit every complete document at the front of the accumulator.
    fn drain_complete(&mut self, out: &mut Vec<Value>) {
        let mut documents = serde_json::Deserializer::from_slice(&self.buffer).into_iter::<Value>();
        let mut garbage = false;

        loop {
            match documents.next() {
                Some(Ok(document)) => out.push(document),
                Some(Err(e)) if e.is_eof() => break,
                Some(Err(e)) => {
                    tracing::warn!(
                        error = %e,
                        bytes = self.buffer.len(),
                        "Discarding output that is not JSON"
                    );
                    garbage = true;
                    break;
                }
                None => break,
            }
        }

        let consumed = documents.byte_offset();
        drop(documents);

        if garbage {
            self.buffer.clear();
            return;
        }

        self.buffer.drain(..consumed);
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.buffer.clear();
        }
    }
}

/// Decode every document from an async reader until EOF.
///
/// The stream ends after the first error. Any incomplete document left at EOF
/// is logged and dropped.
pub fn decode_stream<R>(mut reader: R) -> impl Stream<Item = Result<Value, DecodeError>>
where
    R: AsyncRead + Unpin,
{
    async_stream::stream! {
        let mut decoder = StreamDecoder::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        let mut documents = Vec::new();

        loop {
            let read = match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    yield Err(DecodeError::Io(e));
                    return;
                }
            };

            let fed = decoder.feed(&chunk[..read], &mut documents);
            for document in documents.drain(..) {
                yield Ok(document);
            }
            if let Err(e) = fed {
                yield Err(e);
                return;
            }
        }

        let leftover = decoder.finish();
        if leftover > 0 {
            tracing::warn!(bytes = leftover, "Stream ended inside an incomplete JSON document");
        }
    }
}
