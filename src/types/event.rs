//! Invocation event received from the bot platform.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session attribute naming the table that maps sessions to live connections.
pub const STREAMING_TABLE_ATTRIBUTE: &str = "streamingDynamoDbTable";
/// Session attribute carrying the push endpoint of the live connection.
pub const STREAMING_ENDPOINT_ATTRIBUTE: &str = "streamingEndpoint";

/// A single invocation of the LLM hook.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationEvent {
    pub prompt: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub session_state: SessionState,
    #[serde(default)]
    pub request_attributes: Option<Value>,
}

/// The platform's view of the conversation, echoed back when closing a dialogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_attributes: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where streamed fragments should be relayed for this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingTarget {
    /// Table holding the durable connection record.
    pub table: String,
    /// Push endpoint of the live connection service.
    pub endpoint: String,
}

impl InvocationEvent {
    /// Create an event carrying only a prompt and parameters.
    pub fn new(prompt: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            prompt: prompt.into(),
            parameters,
            session_id: None,
            session_state: SessionState::default(),
            request_attributes: None,
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.session_state
            .session_attributes
            .as_ref()?
            .get(name)?
            .as_str()
            .filter(|v| !v.is_empty())
    }

    /// The streaming target, present only when both the table and the
    /// endpoint attributes are set.
    pub fn streaming_target(&self) -> Option<StreamingTarget> {
        Some(StreamingTarget {
            table: self.attribute(STREAMING_TABLE_ATTRIBUTE)?.to_string(),
            endpoint: self.attribute(STREAMING_ENDPOINT_ATTRIBUTE)?.to_string(),
        })
    }
}
