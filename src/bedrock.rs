//! HTTP client for the Bedrock runtime inference API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::{future, StreamExt};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::event_stream::{EventStreamExt, EventStreamMessage};
use crate::provider::InferenceBackend;
use crate::{AdapterConfig, ChunkEvent, ChunkStream, Error};

const SERVICE: &str = "bedrock-runtime";
const JSON: &str = "application/json";

/// Bedrock runtime provider implementation.
pub struct BedrockRuntimeClient {
    client: Client,
    endpoint_url: String,
    bearer_token: Option<String>,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct ChunkPayload {
    bytes: String,
}

impl BedrockRuntimeClient {
    /// Create a client for the endpoint and credentials in `config`.
    pub fn new(config: &AdapterConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint_url: config.endpoint_url.clone(),
            bearer_token: config.bearer_token.clone(),
            request_timeout: config.request_timeout,
        })
    }

    /// Create a new client with custom base URL.
    pub fn new_with_base_url(base_url: String) -> Result<Self, Error> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            endpoint_url: base_url,
            bearer_token: None,
            request_timeout: Duration::from_secs(60),
        })
    }

    fn model_url(&self, model_id: &str, action: &str) -> String {
        format!(
            "{}/model/{}/{}",
            self.endpoint_url.trim_end_matches('/'),
            urlencoding::encode(model_id),
            action
        )
    }

    fn post(&self, url: String, body: &Value) -> RequestBuilder {
        let request = self
            .client
            .post(url)
            .header("Content-Type", JSON)
            .json(body);

        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Pull a human-readable message out of an error body.
pub(crate) fn error_message(body_text: &str) -> String {
    serde_json::from_str::<Value>(body_text)
        .ok()
        .and_then(|json| {
            ["message", "Message", "errorMessage"]
                .iter()
                .find_map(|key| json.get(*key).and_then(Value::as_str).map(str::to_owned))
        })
        .unwrap_or_else(|| body_text.trim().to_string())
}

pub(crate) async fn ensure_success(
    service: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body_text = response.text().await.unwrap_or_default();
    Err(Error::transport_status(
        service,
        status.as_u16(),
        format!("API error ({status}): {}", error_message(&body_text)),
    ))
}

/// Convert one event-stream message into a chunk event.
///
/// Non-chunk events yield `None`; exception messages become transport errors.
fn chunk_from_message(message: EventStreamMessage) -> Result<Option<ChunkEvent>, Error> {
    if matches!(message.message_type(), Some("exception") | Some("error")) {
        let kind = message
            .exception_type()
            .or_else(|| message.header_str(":error-code"))
            .unwrap_or("UnknownException");
        let detail = error_message(&String::from_utf8_lossy(&message.payload));
        return Err(Error::transport(SERVICE, format!("{kind}: {detail}")));
    }

    if message.event_type() != Some("chunk") {
        return Ok(None);
    }

    let payload: ChunkPayload = serde_json::from_slice(&message.payload)
        .map_err(|e| Error::streaming(format!("Invalid chunk envelope: {e}")))?;
    let bytes = STANDARD
        .decode(payload.bytes.as_bytes())
        .map_err(|e| Error::streaming(format!("Invalid base64 in chunk: {e}")))?;

    Ok(Some(ChunkEvent::new(bytes)))
}

#[async_trait::async_trait]
impl InferenceBackend for BedrockRuntimeClient {
    async fn invoke(&self, model_id: &str, body: &Value) -> Result<Value, Error> {
        tracing::debug!(model_id, "invoking model");

        let response = self
            .post(self.model_url(model_id, "invoke"), body)
            .header("Accept", JSON)
            .timeout(self.request_timeout)
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;

        Ok(response.json::<Value>().await?)
    }

    async fn invoke_streaming(&self, model_id: &str, body: &Value) -> Result<ChunkStream, Error> {
        tracing::debug!(model_id, "invoking model with response stream");

        let request = self
            .post(self.model_url(model_id, "invoke-with-response-stream"), body)
            .header("Accept", "application/vnd.amazon.eventstream")
            .header("X-Amzn-Bedrock-Accept", JSON)
            .send();
        let response = tokio::time::timeout(self.request_timeout, request)
            .await
            .map_err(|_| Error::transport(SERVICE, "timed out waiting for stream to open"))??;
        let response = ensure_success(SERVICE, response).await?;

        let chunks = response
            .bytes_stream()
            .event_stream()
            .filter_map(|message| future::ready(message.and_then(chunk_from_message).transpose()));

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_stream::HeaderValue;
    use bytes::Bytes;

    fn message(headers: &[(&str, &str)], payload: &str) -> EventStreamMessage {
        EventStreamMessage {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), HeaderValue::String(v.to_string())))
                .collect(),
            payload: Bytes::from(payload.to_string()),
        }
    }

    #[test]
    fn test_provider_creation() {
        let client = BedrockRuntimeClient::new(&AdapterConfig::new("us-east-1"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_model_url_encodes_model_id() {
        let client =
            BedrockRuntimeClient::new_with_base_url("http://localhost:8080/".to_string()).unwrap();
        assert_eq!(
            client.model_url("anthropic.claude-3-sonnet-20240229-v1:0", "invoke"),
            "http://localhost:8080/model/anthropic.claude-3-sonnet-20240229-v1%3A0/invoke"
        );
    }

    #[test]
    fn test_chunk_from_message() {
        let chunk = chunk_from_message(message(
            &[(":message-type", "event"), (":event-type", "chunk")],
            r#"{"bytes":"eyJjb21wbGV0aW9uIjoiYSJ9"}"#,
        ))
        .unwrap()
        .unwrap();
        assert_eq!(chunk.bytes, br#"{"completion":"a"}"#.to_vec());

        let other = chunk_from_message(message(
            &[(":message-type", "event"), (":event-type", "initial-response")],
            "{}",
        ))
        .unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_exception_message_is_transport_error() {
        let err = chunk_from_message(message(
            &[(":message-type", "exception"), (":exception-type", "throttlingException")],
            r#"{"message":"Too many requests"}"#,
        ))
        .unwrap_err();

        match err {
            Error::Transport { service, message, .. } => {
                assert_eq!(service, "bedrock-runtime");
                assert_eq!(message, "throttlingException: Too many requests");
            }
            other => panic!("Expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message":"Bad model"}"#), "Bad model");
        assert_eq!(error_message(r#"{"Message":"Gone"}"#), "Gone");
        assert_eq!(error_message(" plain text "), "plain text");
    }
}
