//! AI21 Jurassic bodies.

use serde_json::{json, Map, Value};

use super::path::{overlay, text_at, Segment::*};
use crate::types::DEFAULT_MAX_TOKENS;
use crate::Error;

const PROVIDER: &str = "ai21";

pub(crate) fn request_body(prompt: &str, parameters: &Map<String, Value>) -> Value {
    let mut body = Map::new();
    body.insert("prompt".to_string(), json!(prompt));
    body.insert("maxTokens".to_string(), json!(DEFAULT_MAX_TOKENS));
    overlay(body, parameters)
}

pub(crate) fn response_text(response: &Value) -> Result<String, Error> {
    text_at(
        PROVIDER,
        response,
        &[Key("completions"), Index(0), Key("data"), Key("text")],
    )
}
