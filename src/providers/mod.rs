//! Provider-specific request and response shapes.
//!
//! A model identifier such as `anthropic.claude-3-sonnet-20240229-v1:0`
//! resolves to a [`ModelFamily`]; the family decides how the request body is
//! laid out and where the generated text lives in the response.

pub mod ai21;
pub mod amazon;
pub mod anthropic;
pub mod cohere;
pub mod meta;
mod path;

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Request/response format families supported by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    /// Claude text completions (`claude-v2`, `claude-instant-v1`).
    Anthropic,
    /// Claude 3 messages API.
    Anthropic3,
    Ai21,
    Amazon,
    Cohere,
    Meta,
}

impl ModelFamily {
    /// Resolve the family from a model identifier.
    pub fn from_model_id(model_id: &str) -> Result<Self, Error> {
        let provider = provider_of(model_id);
        match provider {
            "anthropic" if model_id.starts_with("anthropic.claude-3") => Ok(ModelFamily::Anthropic3),
            "anthropic" => Ok(ModelFamily::Anthropic),
            "ai21" => Ok(ModelFamily::Ai21),
            "amazon" => Ok(ModelFamily::Amazon),
            "cohere" => Ok(ModelFamily::Cohere),
            "meta" => Ok(ModelFamily::Meta),
            _ => Err(Error::unsupported_provider(provider)),
        }
    }

    /// The provider prefix this family belongs to.
    pub fn provider(&self) -> &'static str {
        match self {
            ModelFamily::Anthropic | ModelFamily::Anthropic3 => "anthropic",
            ModelFamily::Ai21 => "ai21",
            ModelFamily::Amazon => "amazon",
            ModelFamily::Cohere => "cohere",
            ModelFamily::Meta => "meta",
        }
    }

    /// Build the request body, overlaying caller parameters on the defaults.
    pub fn build_request_body(&self, prompt: &str, parameters: &Map<String, Value>) -> Value {
        match self {
            ModelFamily::Anthropic => anthropic::completion_body(prompt, parameters),
            ModelFamily::Anthropic3 => anthropic::messages_body(prompt, parameters),
            ModelFamily::Ai21 => ai21::request_body(prompt, parameters),
            ModelFamily::Amazon => amazon::request_body(prompt, parameters),
            ModelFamily::Cohere => cohere::request_body(prompt, parameters),
            ModelFamily::Meta => meta::request_body(prompt, parameters),
        }
    }

    /// Extract the generated text from a complete response body.
    pub fn parse_response(&self, response: &Value) -> Result<String, Error> {
        match self {
            ModelFamily::Anthropic => anthropic::completion_text(response),
            ModelFamily::Anthropic3 => anthropic::messages_text(response),
            ModelFamily::Ai21 => ai21::response_text(response),
            ModelFamily::Amazon => amazon::response_text(response),
            ModelFamily::Cohere => cohere::response_text(response),
            ModelFamily::Meta => meta::generation_text(response),
        }
    }

    /// Extract the incremental text carried by one decoded stream chunk.
    ///
    /// `Ok(None)` means the chunk is well formed but carries no text.
    pub fn stream_fragment(&self, chunk: &Value) -> Result<Option<String>, Error> {
        match self {
            ModelFamily::Anthropic => anthropic::completion_text(chunk).map(Some),
            ModelFamily::Anthropic3 => anthropic::messages_fragment(chunk),
            ModelFamily::Ai21 => ai21::response_text(chunk).map(Some),
            ModelFamily::Amazon => amazon::stream_fragment(chunk),
            ModelFamily::Cohere => cohere::stream_fragment(chunk),
            ModelFamily::Meta => meta::generation_text(chunk).map(Some),
        }
    }
}

impl FromStr for ModelFamily {
    type Err = Error;

    fn from_str(model_id: &str) -> Result<Self, Self::Err> {
        Self::from_model_id(model_id)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFamily::Anthropic3 => write!(f, "anthropic (messages)"),
            other => write!(f, "{}", other.provider()),
        }
    }
}

/// The substring before the first `.` of a model identifier.
pub fn provider_of(model_id: &str) -> &str {
    model_id.split_once('.').map_or(model_id, |(provider, _)| provider)
}

/// Build the provider-shaped request body for `model_id`.
pub fn build_request_body(
    model_id: &str,
    parameters: &Map<String, Value>,
    prompt: &str,
) -> Result<Value, Error> {
    Ok(ModelFamily::from_model_id(model_id)?.build_request_body(prompt, parameters))
}

/// Extract the generated text from a response produced by `model_id`.
pub fn parse_response(model_id: &str, response: &Value) -> Result<String, Error> {
    ModelFamily::from_model_id(model_id)?.parse_response(response)
}
