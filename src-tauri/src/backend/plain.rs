//! Raw `text/plain` answer streams.
//!
//! The body is the answer itself, sent in pieces. Every chunk extends the
//! cumulative text; the end of the body makes it final. A chunk may end in
//! the middle of a UTF-8 sequence, so undecoded tail bytes wait for the
//! next chunk.

use super::client::TransportError;
use super::sse::ChunkSource;
use super::types::StreamUpdate;
use super::UpdateSource;

#[derive(Debug, Default)]
pub struct PlainTextDecoder {
    text: String,
    pending: Vec<u8>,
}

impl PlainTextDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Returns the cumulative text as a partial update when
    /// the chunk added any.
    pub fn feed(&mut self, chunk: &[u8]) -> Option<StreamUpdate> {
        let before = self.text.len();
        self.pending.extend_from_slice(chunk);
        self.decode_pending();

        (self.text.len() > before).then(|| StreamUpdate::Partial {
            text: self.text.clone(),
        })
    }

    /// The whole text as the final update, or `None` for an empty body.
    pub fn finish(mut self) -> Option<StreamUpdate> {
        if !self.pending.is_empty() {
            log::warn!("[ASK] Body ended inside a UTF-8 sequence ({} bytes)", self.pending.len());
            self.text.push_str(&String::from_utf8_lossy(&self.pending));
        }
        if self.text.is_empty() {
            return None;
        }
        Some(StreamUpdate::Final {
            text: self.text,
            bbox: None,
        })
    }

    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    self.pending.clear();
                    return;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    self.text
                        .push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        // Invalid bytes: replace and keep going.
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + len);
                        }
                        // Incomplete sequence at the end: wait for more.
                        None => {
                            self.pending.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Pulls a `text/plain` body from a [`ChunkSource`] as cumulative updates.
pub struct PlainTextStream<S> {
    source: S,
    decoder: Option<PlainTextDecoder>,
}

impl<S: ChunkSource> PlainTextStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            decoder: Some(PlainTextDecoder::new()),
        }
    }

    /// Next update, `None` once the body is exhausted. A transport error
    /// ends the stream after it is returned.
    pub async fn next(&mut self) -> Option<Result<StreamUpdate, TransportError>> {
        loop {
            let decoder = self.decoder.as_mut()?;

            match self.source.next_chunk().await {
                Ok(Some(chunk)) => {
                    if let Some(update) = decoder.feed(&chunk) {
                        return Some(Ok(update));
                    }
                }
                Ok(None) => return self.decoder.take()?.finish().map(Ok),
                Err(e) => {
                    self.decoder = None;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<S: ChunkSource> UpdateSource for PlainTextStream<S> {
    async fn next_update(&mut self) -> Option<Result<StreamUpdate, TransportError>> {
        self.next().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct Chunks(VecDeque<Vec<u8>>);

    impl ChunkSource for Chunks {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
            Ok(self.0.pop_front())
        }
    }

    fn stream(chunks: &[&[u8]]) -> PlainTextStream<Chunks> {
        PlainTextStream::new(Chunks(chunks.iter().map(|c| c.to_vec()).collect()))
    }

    #[tokio::test]
    async fn body_text_becomes_the_answer() {
        let mut s = stream(&[b"The mixer is ", b"top right."]);

        let mut updates = Vec::new();
        while let Some(update) = s.next().await {
            updates.push(update.unwrap());
        }
        assert_eq!(
            updates,
            vec![
                StreamUpdate::Partial { text: "The mixer is ".into() },
                StreamUpdate::Partial { text: "The mixer is top right.".into() },
                StreamUpdate::Final { text: "The mixer is top right.".into(), bbox: None },
            ]
        );
    }

    #[test]
    fn multibyte_split_waits_for_the_rest() {
        let bytes = "café".as_bytes();
        let mut decoder = PlainTextDecoder::new();

        let first = decoder.feed(&bytes[..4]).unwrap();
        assert_eq!(first.text(), "caf");
        assert!(decoder.feed(&bytes[4..4]).is_none());
        assert_eq!(decoder.feed(&bytes[4..]).unwrap().text(), "café");
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut decoder = PlainTextDecoder::new();
        assert_eq!(decoder.feed(b"a\xFFb").unwrap().text(), "a\u{FFFD}b");
    }

    #[tokio::test]
    async fn empty_body_yields_nothing() {
        let mut s = stream(&[b""]);
        assert!(s.next().await.is_none());
        assert!(s.next().await.is_none());
    }
}
