//! Anthropic Claude bodies: the legacy text-completions format and the
//! Claude 3 messages format.

use serde_json::{json, Map, Value};

use super::path::{overlay, text_at, Segment::*};
use crate::types::DEFAULT_MAX_TOKENS;
use crate::Error;

const PROVIDER: &str = "anthropic";

/// Protocol version tag required by the messages API on Bedrock.
pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

pub(crate) fn completion_body(prompt: &str, parameters: &Map<String, Value>) -> Value {
    let mut body = Map::new();
    body.insert("prompt".to_string(), json!(prompt));
    body.insert("max_tokens_to_sample".to_string(), json!(DEFAULT_MAX_TOKENS));
    overlay(body, parameters)
}

pub(crate) fn completion_text(response: &Value) -> Result<String, Error> {
    text_at(PROVIDER, response, &[Key("completion")])
}

pub(crate) fn messages_body(prompt: &str, parameters: &Map<String, Value>) -> Value {
    let mut body = Map::new();
    body.insert("anthropic_version".to_string(), json!(ANTHROPIC_VERSION));
    body.insert(
        "messages".to_string(),
        json!([{
            "role": "user",
            "content": [{"type": "text", "text": prompt}]
        }]),
    );
    body.insert("max_tokens".to_string(), json!(DEFAULT_MAX_TOKENS));
    overlay(body, parameters)
}

pub(crate) fn messages_text(response: &Value) -> Result<String, Error> {
    text_at(PROVIDER, response, &[Key("content"), Index(0), Key("text")])
}

/// Messages-API streams interleave text deltas with bookkeeping events
/// (`message_start`, `content_block_stop`, ...); only deltas carry text.
pub(crate) fn messages_fragment(chunk: &Value) -> Result<Option<String>, Error> {
    match chunk.get("type").and_then(Value::as_str) {
        Some("content_block_delta") => {
            text_at(PROVIDER, chunk, &[Key("delta"), Key("text")]).map(Some)
        }
        Some(_) => Ok(None),
        None => Err(Error::malformed(PROVIDER, "type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_body_defaults() {
        let body = messages_body("hi", &Map::new());

        assert_eq!(body["anthropic_version"], "bedrock-2023-05-31");
        assert_eq!(body["max_tokens"], 256);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"][0]["type"], "text");
        assert_eq!(messages[0]["content"][0]["text"], "hi");
    }

    #[test]
    fn test_completion_body_override() {
        let mut parameters = Map::new();
        parameters.insert("max_tokens_to_sample".to_string(), json!(1000));
        parameters.insert("stop_sequences".to_string(), json!(["\n\nHuman:"]));

        let body = completion_body("Human: hi", &parameters);
        assert_eq!(
            body,
            json!({
                "prompt": "Human: hi",
                "max_tokens_to_sample": 1000,
                "stop_sequences": ["\n\nHuman:"]
            })
        );
    }

    #[test]
    fn test_messages_fragment() {
        let delta = json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Hel"}});
        assert_eq!(messages_fragment(&delta).unwrap(), Some("Hel".to_string()));

        let start = json!({"type": "message_start", "message": {}});
        assert_eq!(messages_fragment(&start).unwrap(), None);

        let broken = json!({"type": "content_block_delta", "delta": {}});
        assert!(matches!(
            messages_fragment(&broken),
            Err(Error::MalformedResponse { .. })
        ));
    }
}
