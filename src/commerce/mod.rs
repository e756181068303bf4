//! Clients for the external commerce backend's GraphQL storefront API.
//!
//! The backend is the source of truth for carts, catalog and customer
//! accounts; these modules only translate intents into queries/mutations
//! and normalize the responses. No state is held between calls.

use std::time::Duration;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::AppConfig;

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod customer;

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("commerce backend returned status {0}")]
    Status(StatusCode),

    #[error("GraphQL error: {0}")]
    GraphQL(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request cancelled")]
    Cancelled,
}

impl CommerceError {
    /// Only network-level failures and 5xx answers are worth retrying;
    /// GraphQL-level rejections will not change on a second attempt.
    fn is_transient(&self) -> bool {
        match self {
            CommerceError::Http(_) => true,
            CommerceError::Status(status) => status.is_server_error(),
            _ => false,
        }
    }
}

/// Money value as the backend reports it: a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Money {
    pub amount: Decimal,
}

#[derive(Debug)]
pub struct CommerceClient {
    http: reqwest::Client,
    endpoint: Url,
    access_token: String,
}

impl CommerceClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&format!(
            "https://{}/api/{}/graphql.json",
            config.commerce_domain, config.commerce_api_version
        ))?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            access_token: config.commerce_access_token.clone(),
        })
    }

    /// POST one GraphQL document and return its `data` field. Transient
    /// failures are retried up to three attempts with a fixed short delay.
    pub(crate) async fn execute(
        &self,
        query: &str,
        variables: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, CommerceError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.send(query, &variables, cancel).await {
                Ok(data) => return Ok(data),
                Err(err) if err.is_transient() && attempt < RETRY_ATTEMPTS => {
                    tracing::warn!(attempt, error = %err, "commerce request failed, retrying");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(CommerceError::Cancelled),
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send(
        &self,
        query: &str,
        variables: &Value,
        cancel: &CancellationToken,
    ) -> Result<Value, CommerceError> {
        let request = self
            .http
            .post(self.endpoint.clone())
            .header("X-Shopify-Storefront-Access-Token", &self.access_token)
            .json(&json!({ "query": query, "variables": variables }));

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(CommerceError::Cancelled),
            result = request.send() => result?,
        };

        let status = response.status();
        if status.is_server_error() {
            return Err(CommerceError::Status(status));
        }

        let body: Value = tokio::select! {
            _ = cancel.cancelled() => return Err(CommerceError::Cancelled),
            result = response.json::<Value>() => result?,
        };

        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            let message = errors
                .first()
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown GraphQL error");
            return Err(CommerceError::GraphQL(message.to_string()));
        }

        match body.get("data") {
            Some(data) if !data.is_null() => Ok(data.clone()),
            _ => Err(CommerceError::Malformed("missing data field".to_string())),
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value, context: &str) -> Result<T, CommerceError> {
    serde_json::from_value(value).map_err(|e| CommerceError::Malformed(format!("{context}: {e}")))
}

/// Connection wrapper the backend uses for every list field.
#[derive(Debug, Deserialize)]
pub(crate) struct Edges<T> {
    pub edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge<T> {
    pub node: T,
}

impl<T> Default for Edges<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Edges<T> {
    pub fn into_nodes(self) -> Vec<T> {
        self.edges.into_iter().map(|edge| edge.node).collect()
    }
}
