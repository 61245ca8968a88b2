//! Responses handed back to the bot platform.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::event::InvocationEvent;
use crate::Error;

/// Intent state reported when the streamed answer has been delivered.
pub const FULFILLED: &str = "Fulfilled";

/// Plain-text result of a synchronous invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedText {
    pub generated_text: String,
}

/// "Close dialogue" structure returned after a streamed invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseResponse {
    pub session_state: ClosedSessionState,
    pub messages: Vec<PlatformMessage>,
    pub session_id: String,
    pub request_attributes: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSessionState {
    pub dialog_action: DialogAction,
    pub intent: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogAction {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMessage {
    pub content_type: String,
    pub content: String,
}

impl PlatformMessage {
    pub fn custom_payload(content: impl Into<String>) -> Self {
        Self {
            content_type: "CustomPayload".to_string(),
            content: content.into(),
        }
    }
}

impl CloseResponse {
    /// Close the dialogue of `event` with `message`, marking its intent with
    /// `fulfillment_state`.
    pub fn close(
        event: &InvocationEvent,
        fulfillment_state: &str,
        message: PlatformMessage,
    ) -> Result<Self, Error> {
        let mut intent = event
            .session_state
            .intent
            .clone()
            .filter(Value::is_object)
            .ok_or_else(|| Error::invalid_event("sessionState.intent must be an object"))?;
        intent["state"] = json!(fulfillment_state);

        let session_id = event
            .session_id
            .clone()
            .ok_or_else(|| Error::invalid_event("sessionId is required to close a dialogue"))?;

        Ok(Self {
            session_state: ClosedSessionState {
                dialog_action: DialogAction {
                    kind: "Close".to_string(),
                },
                intent,
            },
            messages: vec![message],
            session_id,
            request_attributes: event.request_attributes.clone(),
        })
    }

    /// Close the dialogue with the full streamed reply as a custom payload.
    pub fn fulfilled(event: &InvocationEvent, reply: impl Into<String>) -> Result<Self, Error> {
        Self::close(event, FULFILLED, PlatformMessage::custom_payload(reply))
    }
}

/// What an invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Text from a synchronous call.
    Text(String),
    /// Dialogue closed after streaming the reply to a live connection.
    Close(CloseResponse),
}

impl Outcome {
    /// The JSON document returned to the platform.
    pub fn into_output(self) -> Result<Value, Error> {
        let value = match self {
            Outcome::Text(generated_text) => serde_json::to_value(GeneratedText { generated_text })?,
            Outcome::Close(close) => serde_json::to_value(close)?,
        };
        Ok(value)
    }
}
