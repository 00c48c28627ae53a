//! Enphase Envoy Prometheus Exporter
//!
//! A Prometheus metrics exporter for the local HTTP API of Enphase Envoy solar gateways.
//!
//! # Overview
//!
//! On every scrape the exporter reads the aggregate production/consumption meters and
//! the latest report of each micro-inverter from the Envoy, and exposes them in
//! Prometheus format. Nothing is cached between scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐        HTTP          ┌──────────────┐
//! │   Envoy     │ ◄─────────────────►  │   Exporter   │
//! │  gateway    │   /production.json   │              │
//! └─────────────┘   /api/v1/.../inv.   │  ┌────────┐  │      HTTP      ┌────────────┐
//!                                      │  │ Client │  │ ◄────────────► │ Prometheus │
//!                                      │  └────────┘  │   /metrics     └────────────┘
//!                                      │  ┌────────┐  │
//!                                      │  │Catalog │  │
//!                                      │  └────────┘  │
//!                                      └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`envoy`] - HTTP client and retry policy
//! - [`collectors`] - Collection cycle and JSON to measurement transform
//! - [`metrics`] - Series definitions and Prometheus rendering
//! - [`server`] - HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use envoy_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - ✅ Production and total consumption meter readings
//! - ✅ Per-inverter wattage and report time
//! - ✅ Bounded retries with randomized waits against a flaky gateway
//! - ✅ All-or-nothing scrapes: no partial metric sets

pub mod collectors;
pub mod config;
pub mod envoy;
pub mod error;
pub mod metrics;
pub mod server;
