//! Envoy HTTP API Client
//!
//! This module provides a client for the local HTTP API of an Enphase Envoy gateway.
//!
//! # Architecture
//!
//! - **Connection**: a single pooled `reqwest::Client`, reused by every scrape so the
//!   embedded device is not asked to accept a fresh TCP connection per request
//! - **Retries**: transient failures are retried according to a [`RetryPolicy`]
//! - **Payloads**: returned as untyped [`serde_json::Value`]; shape checks happen in
//!   the transform stage
//!
//! # Example
//!
//! ```no_run
//! use envoy_exporter::config::EnvoyConfig;
//! use envoy_exporter::envoy::{EnvoyClient, RetryPolicy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EnvoyConfig {
//!     url: "http://envoy.local".to_string(),
//!     user_agent: String::new(),
//!     timeout_seconds: 10,
//! };
//!
//! let client = EnvoyClient::new(&config, RetryPolicy::default())?;
//! let production = client.production().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::EnvoyConfig;
use crate::envoy::RetryPolicy;
use crate::error::{ExporterError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Aggregate production and consumption meters
pub const PRODUCTION_PATH: &str = "/production.json";

/// Latest report of every micro-inverter
pub const INVERTERS_PATH: &str = "/api/v1/production/inverters";

/// Join a base URL and a resource path with exactly one `/` between them.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Client for the Envoy HTTP API
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct EnvoyClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl EnvoyClient {
    pub fn new(config: &EnvoyConfig, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch the aggregate production/consumption document
    pub async fn production(&self) -> Result<Value> {
        self.fetch(PRODUCTION_PATH).await
    }

    /// Fetch the per-inverter production document
    pub async fn inverters(&self) -> Result<Value> {
        self.fetch(INVERTERS_PATH).await
    }

    /// GET `path` relative to the base URL and parse the body as JSON.
    ///
    /// Network errors and non-2xx statuses are retried under the client's
    /// [`RetryPolicy`]; once the budget is spent the last error is returned.
    /// A body that is not JSON fails straight away with
    /// [`ExporterError::InvalidJson`].
    pub async fn fetch(&self, path: &str) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        let client = self;
        let target = url.as_str();

        let body = self
            .retry
            .run(target, move || client.get_text(target))
            .await?;

        serde_json::from_str(&body).map_err(|source| {
            error!("Received invalid data from Envoy at {}: {}", url, source);
            error!("{}", body);
            ExporterError::InvalidJson { url, source }
        })
    }

    /// One attempt, no retries
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.text().await?)
    }
}
