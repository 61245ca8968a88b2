//! Types for streaming responses.

use futures_util::stream::Stream;
use std::pin::Pin;

use crate::Error;

/// One `chunk` event of a streaming inference response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEvent {
    /// Decoded payload: a provider-shaped JSON document.
    pub bytes: Vec<u8>,
}

impl ChunkEvent {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

/// Chunk events in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChunkEvent, Error>> + Send>>;

/// A live connection that receives streamed fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveConnection {
    pub endpoint: String,
    pub connection_id: String,
}
