//! Invocation orchestration: model selection, path choice and result shaping.

use serde_json::{Map, Value};
use std::sync::Arc;

use crate::bedrock::BedrockRuntimeClient;
use crate::provider::InferenceBackend;
use crate::providers::ModelFamily;
use crate::push::{ApiGatewayPusher, ConnectionPusher};
use crate::session_store::{ConnectionStore, DynamoDbConnectionStore};
use crate::streaming::relay_stream;
use crate::{
    AdapterConfig, CloseResponse, Error, InvocationEvent, LiveConnection, Outcome,
    PlatformMessage, StreamingTarget,
};

/// Reserved parameter naming the target model.
pub const MODEL_ID_PARAMETER: &str = "modelId";

/// Everything an invocation needs, built once by the host and shared
/// read-only across invocations.
pub struct LlmAdapter {
    config: AdapterConfig,
    backend: Arc<dyn InferenceBackend>,
    store: Arc<dyn ConnectionStore>,
    pusher: Arc<dyn ConnectionPusher>,
}

impl LlmAdapter {
    pub fn new(
        config: AdapterConfig,
        backend: Arc<dyn InferenceBackend>,
        store: Arc<dyn ConnectionStore>,
        pusher: Arc<dyn ConnectionPusher>,
    ) -> Self {
        Self {
            config,
            backend,
            store,
            pusher,
        }
    }

    /// Create an adapter wired to the HTTP collaborators described by `config`.
    pub fn from_config(config: AdapterConfig) -> Result<Self, Error> {
        tracing::info!(endpoint = %config.endpoint_url, "connecting to inference service");

        let backend = Arc::new(BedrockRuntimeClient::new(&config)?);
        let store = Arc::new(DynamoDbConnectionStore::new(&config)?);
        let pusher = Arc::new(ApiGatewayPusher::new(&config)?);
        Ok(Self::new(config, backend, store, pusher))
    }

    /// Create an adapter from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_config(AdapterConfig::from_env()?)
    }

    /// Remove `modelId` from `parameters`, falling back to the configured default.
    fn take_model_id(&self, parameters: &mut Map<String, Value>) -> Result<String, Error> {
        match parameters.remove(MODEL_ID_PARAMETER) {
            Some(Value::String(model_id)) => Ok(model_id),
            Some(other) => Err(Error::invalid_event(format!(
                "parameters.modelId must be a string, got {other}"
            ))),
            None => Ok(self.config.default_model_id.clone()),
        }
    }

    /// The live-connection target, if this invocation should stream.
    fn streaming_target(&self, event: &InvocationEvent) -> Option<StreamingTarget> {
        if !self.config.streaming_enabled {
            return None;
        }
        event.streaming_target()
    }

    /// Run one invocation and return either the generated text or, when the
    /// reply was streamed to a live connection, the close-dialogue structure.
    pub async fn call_llm(
        &self,
        mut parameters: Map<String, Value>,
        prompt: &str,
        event: &InvocationEvent,
    ) -> Result<Outcome, Error> {
        let model_id = self.take_model_id(&mut parameters)?;
        let family = ModelFamily::from_model_id(&model_id)?;
        let body = family.build_request_body(prompt, &parameters);
        tracing::info!(model_id = %model_id, provider = %family, "resolved model");
        tracing::debug!(body = %body, "request body");

        match self.streaming_target(event) {
            Some(target) => {
                // Built up front so a malformed event fails before anything is pushed.
                let mut close = CloseResponse::fulfilled(event, String::new())?;
                let reply = self.stream_reply(family, &model_id, &body, event, target).await?;
                close.messages = vec![PlatformMessage::custom_payload(reply)];
                Ok(Outcome::Close(close))
            }
            None => {
                let response = self.backend.invoke(&model_id, &body).await?;
                tracing::debug!(response = %response, "response body");
                Ok(Outcome::Text(family.parse_response(&response)?))
            }
        }
    }

    async fn stream_reply(
        &self,
        family: ModelFamily,
        model_id: &str,
        body: &Value,
        event: &InvocationEvent,
        target: StreamingTarget,
    ) -> Result<String, Error> {
        let session_id = event
            .session_id
            .as_deref()
            .ok_or_else(|| Error::invalid_event("sessionId is required for streaming"))?;

        let connection_id = self.store.connection_id(&target.table, session_id).await?;
        tracing::info!(session_id, connection_id = %connection_id, "streaming to live connection");

        let connection = LiveConnection {
            endpoint: target.endpoint,
            connection_id,
        };
        let chunks = self.backend.invoke_streaming(model_id, body).await?;

        relay_stream(
            family,
            chunks,
            self.pusher.as_ref(),
            &connection,
            self.config.stream_read_timeout,
        )
        .await
    }

    /// Handle a typed invocation event and produce the platform response.
    pub async fn handle(&self, event: InvocationEvent) -> Result<Value, Error> {
        let outcome = self
            .call_llm(event.parameters.clone(), &event.prompt, &event)
            .await?;
        let output = outcome.into_output()?;
        tracing::debug!(result = %output, "invocation result");
        Ok(output)
    }

    /// Handle a raw JSON invocation event.
    pub async fn handle_value(&self, event: Value) -> Result<Value, Error> {
        let event: InvocationEvent = serde_json::from_value(event)
            .map_err(|e| Error::invalid_event(e.to_string()))?;
        self.handle(event).await
    }
}
