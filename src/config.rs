use crate::envoy::RetryPolicy;
use crate::error::ExporterError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub envoy: EnvoyConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnvoyConfig {
    /// Base URL of the gateway, e.g. `http://envoy.local`
    #[serde(default = "default_url")]
    pub url: String,
    /// Sent as the `User-Agent` header; the Envoy does not need one
    #[serde(default)]
    pub user_agent: String,
    /// Upper bound for a single request attempt
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_seconds: u64,
    #[serde(default = "default_min_wait")]
    pub min_wait_millis: u64,
    #[serde(default = "default_max_wait")]
    pub max_wait_millis: u64,
}

fn default_url() -> String {
    "http://envoy.local".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9433
}

fn default_max_elapsed() -> u64 {
    30
}

fn default_min_wait() -> u64 {
    1000
}

fn default_max_wait() -> u64 {
    2000
}

impl Default for EnvoyConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user_agent: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_elapsed_seconds: default_max_elapsed(),
            min_wait_millis: default_min_wait(),
            max_wait_millis: default_max_wait(),
        }
    }
}

impl RetryConfig {
    /// Build the retry policy, rejecting an inverted wait range.
    pub fn policy(&self) -> crate::error::Result<RetryPolicy> {
        if self.min_wait_millis > self.max_wait_millis {
            return Err(ExporterError::Config(format!(
                "retry.min_wait_millis ({}) must not exceed retry.max_wait_millis ({})",
                self.min_wait_millis, self.max_wait_millis
            )));
        }

        Ok(RetryPolicy::new(
            Duration::from_secs(self.max_elapsed_seconds),
            Duration::from_millis(self.min_wait_millis),
            Duration::from_millis(self.max_wait_millis),
        ))
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ENVOY_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
