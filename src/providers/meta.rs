//! Meta Llama bodies.

use serde_json::{json, Map, Value};

use super::path::{overlay, text_at, Segment::Key};
use crate::types::DEFAULT_MAX_TOKENS;
use crate::Error;

const PROVIDER: &str = "meta";

pub(crate) fn request_body(prompt: &str, parameters: &Map<String, Value>) -> Value {
    let mut body = Map::new();
    body.insert("prompt".to_string(), json!(prompt));
    body.insert("max_gen_len".to_string(), json!(DEFAULT_MAX_TOKENS));
    overlay(body, parameters)
}

/// Same field for whole responses and stream chunks.
pub(crate) fn generation_text(response: &Value) -> Result<String, Error> {
    text_at(PROVIDER, response, &[Key("generation")])
}
