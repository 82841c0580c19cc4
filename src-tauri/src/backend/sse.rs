//! Incremental server-sent-event decoder for `/ask` answer streams.
//!
//! Transport chunks are not aligned with SSE messages: a chunk may end in
//! the middle of a message, of a `data:` line, or even of a UTF-8 sequence.
//! The decoder therefore buffers raw bytes and only looks at complete
//! messages (terminated by a blank line). Whatever follows the last
//! separator stays buffered until more bytes arrive or the stream ends.

use std::collections::VecDeque;

use serde_json::Value;

use super::client::TransportError;
use super::types::StreamUpdate;
use super::UpdateSource;

const MESSAGE_SEPARATOR: &[u8] = b"\n\n";
const DATA_PREFIX: &str = "data: ";

/// Stateful SSE decoder. Feed chunks in arrival order, then call
/// [`StreamDecoder::finish`] once; a finished decoder cannot be reused.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    terminal_seen: bool,
    malformed_lines: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and decode every message it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamUpdate> {
        self.buffer.extend_from_slice(chunk);

        let mut updates = Vec::new();
        while let Some(pos) = find_separator(&self.buffer) {
            let message: Vec<u8> = self.buffer.drain(..pos + MESSAGE_SEPARATOR.len()).collect();
            self.decode_message(&message[..pos], &mut updates);
        }
        updates
    }

    /// Flush the trailing message, which may lack its blank-line separator.
    pub fn finish(mut self) -> Vec<StreamUpdate> {
        let rest = std::mem::take(&mut self.buffer);
        let mut updates = Vec::new();
        if !rest.is_empty() {
            self.decode_message(&rest, &mut updates);
        }
        if self.malformed_lines > 0 {
            log::warn!("[SSE] Stream ended with {} malformed line(s) dropped", self.malformed_lines);
        }
        updates
    }

    /// Number of `data:` lines dropped because their JSON did not parse.
    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }

    /// Bytes held back waiting for a message separator.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn decode_message(&mut self, message: &[u8], updates: &mut Vec<StreamUpdate>) {
        let block = String::from_utf8_lossy(message);

        for line in block.lines() {
            let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
                continue;
            };
            if payload.trim().is_empty() {
                continue;
            }

            let value = match parse_payload(payload) {
                Ok(value) => value,
                Err(e) => {
                    self.malformed_lines += 1;
                    log::warn!("[SSE] {}", e);
                    continue;
                }
            };

            let Some(update) = StreamUpdate::from_payload(&value) else {
                log::debug!("[SSE] Payload without text field skipped");
                continue;
            };

            if self.terminal_seen {
                log::warn!("[SSE] Update after final payload dropped");
                continue;
            }
            self.terminal_seen = update.is_terminal();
            updates.push(update);
        }
    }
}

fn find_separator(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(MESSAGE_SEPARATOR.len())
        .position(|w| w == MESSAGE_SEPARATOR)
}

fn parse_payload(payload: &str) -> Result<Value, ParseError> {
    serde_json::from_str(payload).map_err(|source| ParseError {
        line: payload.chars().take(120).collect(),
        source,
    })
}

/// A single `data:` line whose JSON payload did not parse. Never fatal:
/// the line is dropped and decoding continues.
#[derive(Debug, thiserror::Error)]
#[error("Malformed event payload {line:?}: {source}")]
pub struct ParseError {
    pub line: String,
    #[source]
    pub source: serde_json::Error,
}

/// Anything that yields raw response chunks in arrival order.
#[allow(async_fn_in_trait)]
pub trait ChunkSource {
    /// `Ok(None)` marks the end of the stream.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

/// Lazily pulls chunks from a [`ChunkSource`] and hands out decoded updates
/// one at a time, holding any extras in an ordered queue.
pub struct UpdateStream<S> {
    source: S,
    decoder: Option<StreamDecoder>,
    pending: VecDeque<StreamUpdate>,
}

impl<S: ChunkSource> UpdateStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            decoder: Some(StreamDecoder::new()),
            pending: VecDeque::new(),
        }
    }

    /// Next update, `None` once the stream and the queue are exhausted.
    ///
    /// A transport error ends the stream after it is returned.
    pub async fn next(&mut self) -> Option<Result<StreamUpdate, TransportError>> {
        loop {
            if let Some(update) = self.pending.pop_front() {
                return Some(Ok(update));
            }
            if self.decoder.is_none() {
                return None;
            }

            match self.source.next_chunk().await {
                Ok(Some(chunk)) => {
                    if let Some(decoder) = self.decoder.as_mut() {
                        self.pending.extend(decoder.feed(&chunk));
                    }
                }
                Ok(None) => {
                    if let Some(decoder) = self.decoder.take() {
                        self.pending.extend(decoder.finish());
                    }
                }
                Err(e) => {
                    self.decoder = None;
                    self.pending.clear();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<S: ChunkSource> UpdateSource for UpdateStream<S> {
    async fn next_update(&mut self) -> Option<Result<StreamUpdate, TransportError>> {
        self.next().await
    }
}
