use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while adapting an invocation to the inference backend.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    #[error("Malformed {provider} response: missing `{field}`")]
    MalformedResponse { provider: String, field: String },

    #[error("No connection record for session '{session_id}' in table '{table}'")]
    ConnectionLookup { session_id: String, table: String },

    #[error("Transport error: {service} - {message}")]
    Transport {
        service: String,
        message: String,
        /// HTTP status, when the failure came from a response.
        status: Option<u16>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Streaming error: {0}")]
    Streaming(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),
}

impl Error {
    pub fn unsupported_provider(provider: impl Into<String>) -> Self {
        Error::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    pub fn malformed(provider: impl Into<String>, field: impl Into<String>) -> Self {
        Error::MalformedResponse {
            provider: provider.into(),
            field: field.into(),
        }
    }

    pub fn transport(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transport {
            service: service.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn transport_status(
        service: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Error::Transport {
            service: service.into(),
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn streaming(message: impl Into<String>) -> Self {
        Error::Streaming(message.into())
    }

    pub fn invalid_event(message: impl Into<String>) -> Self {
        Error::InvalidEvent(message.into())
    }

    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Transport {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Class name reported in structured error responses.
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::UnsupportedProvider { .. } => "UnsupportedProviderError",
            Error::MalformedResponse { .. } => "MalformedResponseError",
            Error::ConnectionLookup { .. } => "ConnectionLookupError",
            Error::Http(_) | Error::Transport { .. } => "TransportError",
            Error::Serialization(_) => "SerializationError",
            Error::Config(_) => "ConfigurationError",
            Error::Streaming(_) => "StreamingError",
            Error::InvalidEvent(_) => "InvalidEventError",
        }
    }
}

/// Structured error object returned at the invocation boundary.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: String,
    pub error_message: String,
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        Self {
            error_type: error.error_type().to_string(),
            error_message: error.to_string(),
        }
    }
}
