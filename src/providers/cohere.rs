//! Cohere Command bodies.

use serde_json::{json, Map, Value};

use super::path::{overlay, text_at, Segment::*};
use crate::types::DEFAULT_MAX_TOKENS;
use crate::Error;

const PROVIDER: &str = "cohere";

pub(crate) fn request_body(prompt: &str, parameters: &Map<String, Value>) -> Value {
    let mut body = Map::new();
    body.insert("prompt".to_string(), json!(prompt));
    body.insert("max_tokens".to_string(), json!(DEFAULT_MAX_TOKENS));
    overlay(body, parameters)
}

pub(crate) fn response_text(response: &Value) -> Result<String, Error> {
    text_at(PROVIDER, response, &[Key("generations"), Index(0), Key("text")])
}

/// The closing chunk carries `is_finished` and a finish reason but no text.
pub(crate) fn stream_fragment(chunk: &Value) -> Result<Option<String>, Error> {
    let finished = chunk.get("is_finished").and_then(Value::as_bool) == Some(true);
    if finished && chunk.get("text").is_none() {
        return Ok(None);
    }
    text_at(PROVIDER, chunk, &[Key("text")]).map(Some)
}
