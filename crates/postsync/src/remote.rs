//! Client for the read-only post resource used to enrich records.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RemoteConfig;

/// Post content returned by the remote resource.
///
/// Only the fields the store needs are decoded; anything else in the body
/// (the upstream also echoes `id`) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentPayload {
    pub title: String,
    pub body: String,
    #[serde(rename = "userId")]
    pub owner_id: i64,
}

/// Failures from a single fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response (DNS, connect, timeout, reset).
    #[error("Request for post {id} failed: {message}")]
    Transport { id: i64, message: String },

    /// The resource answered with a non-2xx status.
    #[error("Failed to fetch post {id}: status code {status}")]
    Status { id: i64, status: u16 },

    /// A 2xx response whose body is not a valid post.
    #[error("Failed to decode post {id}: {message}")]
    Decode { id: i64, message: String },
}

impl RemoteError {
    /// Transport failures and non-2xx statuses are transient; a bad body is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RemoteError::Transport { .. } | RemoteError::Status { .. }
        )
    }

    pub fn id(&self) -> i64 {
        match self {
            RemoteError::Transport { id, .. }
            | RemoteError::Status { id, .. }
            | RemoteError::Decode { id, .. } => *id,
        }
    }
}

/// Fetch-by-id access to the enrichment source.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self, id: i64) -> Result<EnrichmentPayload, RemoteError>;
}

/// `RemoteSource` over HTTP: `GET {base_url}/posts/{id}`.
pub struct HttpRemote {
    client: Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("postsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, &config.base_url))
    }

    /// Uses an already configured client.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn post_url(&self, id: i64) -> String {
        format!("{}/posts/{}", self.base_url, id)
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn fetch(&self, id: i64) -> Result<EnrichmentPayload, RemoteError> {
        let url = self.post_url(id);
        debug!("Fetching post {} from {}", id, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RemoteError::Transport {
                id,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "Remote request for post {} failed with status {}",
                id, status
            );
            return Err(RemoteError::Status {
                id,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| RemoteError::Transport {
            id,
            message: e.to_string(),
        })?;

        serde_json::from_slice(&body).map_err(|e| RemoteError::Decode {
            id,
            message: e.to_string(),
        })
    }
}
