use std::env;
use std::time::Duration;

use crate::Error;

/// Model used when the caller's parameters carry no `modelId`.
pub const DEFAULT_MODEL_ID: &str = "anthropic.claude-instant-v1";

/// Output token limit placed in every request body unless the caller overrides it.
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// Process-level configuration for the adapter, resolved once at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    pub default_model_id: String,
    pub region: String,
    /// Inference runtime endpoint.
    pub endpoint_url: String,
    /// Session store endpoint used to resolve live connections.
    pub session_store_url: String,
    pub streaming_enabled: bool,
    pub bearer_token: Option<String>,
    pub request_timeout: Duration,
    pub stream_read_timeout: Duration,
    pub push_retry_max_elapsed: Duration,
}

impl AdapterConfig {
    /// Create a configuration for `region` with every other value at its default.
    pub fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            default_model_id: DEFAULT_MODEL_ID.to_string(),
            endpoint_url: runtime_endpoint(&region),
            session_store_url: session_store_endpoint(&region),
            region,
            streaming_enabled: false,
            bearer_token: None,
            request_timeout: Duration::from_secs(60),
            stream_read_timeout: Duration::from_secs(30),
            push_retry_max_elapsed: Duration::from_millis(2000),
        }
    }

    /// Override the inference endpoint (useful for testing).
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = endpoint_url.into();
        self
    }

    /// Override the session store endpoint (useful for testing).
    pub fn with_session_store_url(mut self, url: impl Into<String>) -> Self {
        self.session_store_url = url.into();
        self
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming_enabled = enabled;
        self
    }

    pub fn with_default_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.default_model_id = model_id.into();
        self
    }

    pub fn with_push_retry_max_elapsed(mut self, window: Duration) -> Self {
        self.push_retry_max_elapsed = window;
        self
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let region = non_blank("AWS_REGION_OVERRIDE")
            .or_else(|| non_blank("AWS_REGION"))
            .ok_or_else(|| {
                Error::config("AWS_REGION_OVERRIDE or AWS_REGION environment variable is required")
            })?;

        let mut config = Self::new(region);

        if let Some(model_id) = lookup("DEFAULT_MODEL_ID") {
            config.default_model_id = model_id;
        }
        if let Some(url) = lookup("ENDPOINT_URL") {
            config.endpoint_url = url;
        }
        if let Some(url) = lookup("SESSION_STORE_ENDPOINT_URL") {
            config.session_store_url = url;
        }
        if let Some(flag) = lookup("STREAMING_ENABLED") {
            config.streaming_enabled = parse_flag(&flag);
        }
        config.bearer_token = lookup("AWS_BEARER_TOKEN_BEDROCK").filter(|t| !t.is_empty());

        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(parse_number("REQUEST_TIMEOUT_SECS", &secs)?);
        }
        if let Some(secs) = lookup("STREAM_READ_TIMEOUT_SECS") {
            config.stream_read_timeout =
                Duration::from_secs(parse_number("STREAM_READ_TIMEOUT_SECS", &secs)?);
        }
        if let Some(ms) = lookup("PUSH_RETRY_MAX_ELAPSED_MS") {
            config.push_retry_max_elapsed =
                Duration::from_millis(parse_number("PUSH_RETRY_MAX_ELAPSED_MS", &ms)?);
        }

        Ok(config)
    }
}

fn runtime_endpoint(region: &str) -> String {
    format!("https://bedrock-runtime.{region}.amazonaws.com")
}

fn session_store_endpoint(region: &str) -> String {
    format!("https://dynamodb.{region}.amazonaws.com")
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_number(name: &str, value: &str) -> Result<u64, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{name} must be a non-negative integer, got '{value}'")))
}
