//! Amazon Titan text bodies. Caller parameters belong to the nested
//! generation config rather than the top level.

use serde_json::{json, Map, Value};

use super::path::{overlay, text_at, Segment::*};
use crate::types::DEFAULT_MAX_TOKENS;
use crate::Error;

const PROVIDER: &str = "amazon";

pub(crate) fn request_body(prompt: &str, parameters: &Map<String, Value>) -> Value {
    let mut config = Map::new();
    config.insert("maxTokenCount".to_string(), json!(DEFAULT_MAX_TOKENS));

    json!({
        "inputText": prompt,
        "textGenerationConfig": overlay(config, parameters),
    })
}

pub(crate) fn response_text(response: &Value) -> Result<String, Error> {
    text_at(PROVIDER, response, &[Key("results"), Index(0), Key("outputText")])
}

pub(crate) fn stream_fragment(chunk: &Value) -> Result<Option<String>, Error> {
    text_at(PROVIDER, chunk, &[Key("outputText")]).map(Some)
}
