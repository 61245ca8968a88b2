//! A multi-provider adapter between a conversational-bot platform and the
//! Bedrock runtime.
//!
//! This library builds provider-specific request bodies for Anthropic, AI21,
//! Amazon, Cohere and Meta models, extracts the generated text from their
//! responses, and can relay a streamed response fragment by fragment to a
//! live websocket connection.

pub mod error;
pub mod types;
pub mod provider;
pub mod providers;
pub mod bedrock;
pub mod event_stream;
pub mod accumulator;
pub mod session_store;
pub mod push;
pub mod streaming;
pub mod handler;

// Re-export core types for easy usage
pub use error::{Error, ErrorResponse};
pub use types::*;
pub use provider::InferenceBackend;
pub use providers::{build_request_body, parse_response, ModelFamily};
pub use bedrock::BedrockRuntimeClient;
pub use event_stream::{EventStreamExt, EventStreamMessage};
pub use accumulator::ReplyAccumulator;
pub use session_store::{ConnectionStore, DynamoDbConnectionStore, InMemoryConnectionStore};
pub use push::{ApiGatewayPusher, ConnectionPusher};
pub use streaming::relay_stream;
pub use handler::LlmAdapter;
