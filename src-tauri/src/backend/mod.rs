//! Inference backend domain: `/ask` client, wire types, SSE and plain-text decoding.

pub mod client;
pub mod plain;
pub mod sse;
pub mod types;

pub use client::{AskResponse, BackendClient, BodyKind, TransportError};
pub use plain::{PlainTextDecoder, PlainTextStream};
pub use sse::{ChunkSource, StreamDecoder, UpdateStream};
pub use types::{BoundingBox, StreamUpdate};

/// An ordered, finite source of answer updates for one request.
#[allow(async_fn_in_trait)]
pub trait UpdateSource {
    /// `None` once no further updates will arrive.
    async fn next_update(&mut self) -> Option<Result<StreamUpdate, TransportError>>;
}
