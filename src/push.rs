//! Pushing streamed fragments to a live websocket connection.

use backoff::ExponentialBackoffBuilder;
use reqwest::Client;
use std::time::Duration;

use crate::bedrock::ensure_success;
use crate::{AdapterConfig, Error, LiveConnection};

const SERVICE: &str = "apigateway";

/// Delivers data to a live connection.
#[async_trait::async_trait]
pub trait ConnectionPusher: Send + Sync + 'static {
    async fn post(&self, connection: &LiveConnection, data: &str) -> Result<(), Error>;
}

/// Pusher for the API Gateway connection management API.
///
/// Transient failures are retried with exponential backoff until the retry
/// window elapses; anything else fails immediately. Requests are not
/// SigV4-signed, so the endpoint must be a signing proxy or an emulator.
pub struct ApiGatewayPusher {
    client: Client,
    request_timeout: Duration,
    retry_window: Duration,
    initial_interval: Duration,
}

impl ApiGatewayPusher {
    pub fn new(config: &AdapterConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            request_timeout: config.request_timeout,
            retry_window: config.push_retry_max_elapsed,
            initial_interval: Duration::from_millis(50),
        })
    }

    /// Set the first retry delay.
    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    fn connection_url(connection: &LiveConnection) -> String {
        format!(
            "{}/@connections/{}",
            connection.endpoint.trim_end_matches('/'),
            urlencoding::encode(&connection.connection_id)
        )
    }
}

fn classify(error: Error) -> backoff::Error<Error> {
    if error.is_transient() {
        backoff::Error::transient(error)
    } else {
        backoff::Error::permanent(error)
    }
}

#[async_trait::async_trait]
impl ConnectionPusher for ApiGatewayPusher {
    async fn post(&self, connection: &LiveConnection, data: &str) -> Result<(), Error> {
        let url = Self::connection_url(connection);
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(Duration::from_secs(1))
            .with_max_elapsed_time(Some(self.retry_window))
            .build();

        let attempt = || {
            let request = self
                .client
                .post(&url)
                .timeout(self.request_timeout)
                .body(data.to_owned());
            async move {
                let response = request.send().await.map_err(|e| classify(Error::from(e)))?;
                ensure_success(SERVICE, response).await.map_err(classify)?;
                Ok::<(), backoff::Error<Error>>(())
            }
        };

        backoff::future::retry_notify(policy, attempt, |error: Error, wait: Duration| {
            tracing::warn!(
                connection_id = %connection.connection_id,
                "push failed, retrying in {wait:?}: {error}"
            );
        })
        .await
    }
}
