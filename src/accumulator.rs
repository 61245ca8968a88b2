//! Fragment accumulation logic for streaming responses.

use serde_json::Value;

use crate::providers::ModelFamily;
use crate::types::ChunkEvent;
use crate::Error;

/// Decode the payload of a chunk event as JSON.
pub fn decode_chunk(chunk: &ChunkEvent) -> Result<Value, Error> {
    serde_json::from_slice(&chunk.bytes)
        .map_err(|e| Error::streaming(format!("Invalid chunk payload: {e}")))
}

/// Accumulates streamed fragments into the full reply.
#[derive(Debug)]
pub struct ReplyAccumulator {
    family: ModelFamily,
    reply: String,
    fragments: usize,
}

impl ReplyAccumulator {
    /// Create a new accumulator for responses of `family`.
    pub fn new(family: ModelFamily) -> Self {
        Self {
            family,
            reply: String::new(),
            fragments: 0,
        }
    }

    /// Decode a chunk, extract its fragment and append it to the reply.
    ///
    /// Returns the fragment alone so the caller can relay it; `None` when the
    /// chunk carried no text.
    pub fn process_chunk(&mut self, chunk: &ChunkEvent) -> Result<Option<String>, Error> {
        let payload = decode_chunk(chunk)?;
        let fragment = self.family.stream_fragment(&payload)?;

        if let Some(text) = &fragment {
            self.reply.push_str(text);
            self.fragments += 1;
        }

        Ok(fragment)
    }

    /// The reply accumulated so far.
    pub fn current_reply(&self) -> &str {
        &self.reply
    }

    /// Number of fragments appended so far.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    /// Finalize and return the full reply.
    pub fn finalize(self) -> String {
        self.reply
    }
}
