//! Durable records mapping a session to its live connection.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::bedrock::ensure_success;
use crate::{AdapterConfig, Error};

const SERVICE: &str = "dynamodb";

/// Key attribute of a connection record.
pub const SESSION_KEY: &str = "sessionId";
/// Attribute holding the live connection id.
pub const CONNECTION_ATTRIBUTE: &str = "connectionId";

/// Looks up the live connection registered for a session.
#[async_trait::async_trait]
pub trait ConnectionStore: Send + Sync + 'static {
    /// Return the connection id recorded for `session_id` in `table`.
    ///
    /// A missing record is an [`Error::ConnectionLookup`].
    async fn connection_id(&self, table: &str, session_id: &str) -> Result<String, Error>;
}

/// Connection store backed by the DynamoDB JSON API.
///
/// Requests are not SigV4-signed; point the endpoint at a signing proxy or a
/// local emulator.
pub struct DynamoDbConnectionStore {
    client: Client,
    endpoint_url: String,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct GetItemOutput {
    #[serde(rename = "Item")]
    item: Option<HashMap<String, AttributeValue>>,
}

#[derive(Deserialize)]
struct AttributeValue {
    #[serde(rename = "S")]
    s: Option<String>,
}

impl DynamoDbConnectionStore {
    pub fn new(config: &AdapterConfig) -> Result<Self, Error> {
        Self::new_with_base_url(config.session_store_url.clone(), config.request_timeout)
    }

    /// Create a store talking to a custom endpoint.
    pub fn new_with_base_url(endpoint_url: String, request_timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint_url,
            request_timeout,
        })
    }
}

#[async_trait::async_trait]
impl ConnectionStore for DynamoDbConnectionStore {
    async fn connection_id(&self, table: &str, session_id: &str) -> Result<String, Error> {
        let request = json!({
            "TableName": table,
            "Key": { SESSION_KEY: { "S": session_id } },
            "ConsistentRead": true,
        });

        let response = self
            .client
            .post(&self.endpoint_url)
            .header("Content-Type", "application/x-amz-json-1.0")
            .header("X-Amz-Target", "DynamoDB_20120810.GetItem")
            .timeout(self.request_timeout)
            .body(request.to_string())
            .send()
            .await?;
        let output: GetItemOutput = ensure_success(SERVICE, response).await?.json().await?;

        output
            .item
            .and_then(|mut item| item.remove(CONNECTION_ATTRIBUTE))
            .and_then(|value| value.s)
            .ok_or_else(|| Error::ConnectionLookup {
                session_id: session_id.to_string(),
                table: table.to_string(),
            })
    }
}

/// Connection store held in memory, for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryConnectionStore {
    records: RwLock<HashMap<(String, String), String>>,
}

impl InMemoryConnectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `connection_id` for `session_id` in `table`.
    pub async fn insert(
        &self,
        table: impl Into<String>,
        session_id: impl Into<String>,
        connection_id: impl Into<String>,
    ) {
        self.records
            .write()
            .await
            .insert((table.into(), session_id.into()), connection_id.into());
    }
}

#[async_trait::async_trait]
impl ConnectionStore for InMemoryConnectionStore {
    async fn connection_id(&self, table: &str, session_id: &str) -> Result<String, Error> {
        self.records
            .read()
            .await
            .get(&(table.to_string(), session_id.to_string()))
            .cloned()
            .ok_or_else(|| Error::ConnectionLookup {
                session_id: session_id.to_string(),
                table: table.to_string(),
            })
    }
}
