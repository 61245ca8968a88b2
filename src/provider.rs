use serde_json::Value;

use crate::{ChunkStream, Error};

/// A backend that runs inference for a model identifier.
#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync + 'static {
    /// Run a single request and return the whole response body.
    async fn invoke(&self, model_id: &str, body: &Value) -> Result<Value, Error>;

    /// Run a request whose response arrives as a sequence of chunk events.
    async fn invoke_streaming(&self, model_id: &str, body: &Value) -> Result<ChunkStream, Error>;
}
