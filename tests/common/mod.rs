//! Shared helpers for integration tests: Envoy payload fixtures and a mock gateway.
#![allow(dead_code)]

use envoy_exporter::config::EnvoyConfig;
use envoy_exporter::envoy::{EnvoyClient, RetryPolicy, INVERTERS_PATH, PRODUCTION_PATH};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Retry policy with a budget small enough for tests
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(
        Duration::from_millis(300),
        Duration::from_millis(20),
        Duration::from_millis(50),
    )
}

pub fn envoy_config(url: &str) -> EnvoyConfig {
    EnvoyConfig {
        url: url.to_string(),
        user_agent: String::new(),
        timeout_seconds: 5,
    }
}

pub fn client_for(server: &MockServer) -> EnvoyClient {
    EnvoyClient::new(&envoy_config(&server.uri()), fast_policy()).expect("Failed to build client")
}

/// One meter entry as found in `production.json`
pub fn meter_entry(measurement_type: &str, w_now: f64) -> Value {
    json!({
        "type": "eim",
        "activeCount": 1,
        "measurementType": measurement_type,
        "readingTime": 1_700_000_000,
        "wNow": w_now,
        "whLifetime": 15_234_567.891,
        "varhLeadLifetime": 1_234.5,
        "varhLagLifetime": 8_765_432.1,
        "vahLifetime": 20_345_678.9,
        "rmsCurrent": 12.3,
        "rmsVoltage": 241.2,
        "reactPwr": -321.45,
        "apprntPwr": 2_950.7,
        "pwrFactor": 0.98,
        "whToday": 12_345,
        "whLastSevenDays": 98_765,
        "vahToday": 14_000,
        "varhLeadToday": 12,
        "varhLagToday": 3_456
    })
}

/// A `production.json` with one production meter, net consumption and total consumption
pub fn production_document() -> Value {
    json!({
        "production": [
            {
                "type": "inverters",
                "activeCount": 3,
                "readingTime": 1_700_000_000,
                "wNow": 2_700,
                "whLifetime": 15_000_000
            },
            meter_entry("production", 2_875.5)
        ],
        "consumption": [
            meter_entry("total-consumption", 1_210.25),
            meter_entry("net-consumption", -1_665.25)
        ],
        "storage": [{"type": "acb", "activeCount": 0, "wNow": 0}]
    })
}

pub fn inverter_entry(serial: &str, watts: i64, report_date: i64) -> Value {
    json!({
        "serialNumber": serial,
        "lastReportDate": report_date,
        "devType": 1,
        "lastReportWatts": watts,
        "maxReportWatts": 296
    })
}

pub fn inverters_document() -> Value {
    json!([
        inverter_entry("121900000001", 251, 1_700_000_001),
        inverter_entry("121900000002", 248, 1_700_000_002),
        inverter_entry("121900000003", 0, 1_700_000_003)
    ])
}

/// Mount both Envoy endpoints with healthy payloads
pub async fn mount_healthy_envoy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(PRODUCTION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(production_document()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(INVERTERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(inverters_document()))
        .mount(server)
        .await;
}

/// Count requests the mock server received for `request_path`
pub async fn requests_to(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
