//! Rate-limited JSON fetcher
//!
//! Every outbound GET goes through one [`RateLimiter`]. Bodies are decoded into
//! a tagged reply (API error shape vs payload) before the payload type is
//! applied, so an error body can never be mistaken for an empty result.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::rate_limit::{RateLimitConfig, RateLimiter};
use crate::config::Config;
use crate::error::ApiError;

/// Raw HTTP response as seen by the fetcher
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single GET. Implementations must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpReply, ApiError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpReply, ApiError> {
        let transport_err = |e: reqwest::Error| ApiError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_err)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(transport_err)?;

        Ok(HttpReply { status, body })
    }
}

/// Error shape returned by the API instead of a payload
#[derive(Debug, Deserialize)]
struct RemoteError {
    status: u16,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiReply {
    Failure(RemoteError),
    Success(Value),
}

/// Decode a reply into `T`, surfacing the API's own error message when present.
pub fn decode<T: DeserializeOwned>(url: &str, reply: &HttpReply) -> Result<T, ApiError> {
    let parsed: ApiReply = match serde_json::from_str(&reply.body) {
        Ok(parsed) => parsed,
        Err(_) if !reply.is_success() => {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: reply.status,
            })
        }
        Err(e) => {
            return Err(ApiError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
        }
    };

    match parsed {
        ApiReply::Failure(err) => Err(ApiError::Remote {
            status: err.status,
            message: err.message,
        }),
        ApiReply::Success(_) if !reply.is_success() => Err(ApiError::Status {
            url: url.to_string(),
            status: reply.status,
        }),
        ApiReply::Success(value) => serde_json::from_value(value).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        }),
    }
}

pub struct Fetcher {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, limits: RateLimitConfig) -> Self {
        Self {
            transport,
            limiter: RateLimiter::new(limits),
        }
    }

    /// reqwest-backed fetcher using the configured agent, timeout and budget.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.user_agent, config.timeout())?;
        Ok(Self::new(Arc::new(transport), config.rate_limit.clone()))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let reply = {
            let _permit = self.limiter.acquire().await;
            debug!(url = %url, "GET");
            self.transport.get(url).await?
        };
        debug!(url = %url, status = reply.status, bytes = reply.body.len(), "response received");

        decode(url, &reply)
    }
}
