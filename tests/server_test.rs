//! Server integration tests
//!
//! Serves the exporter router on an ephemeral port in front of a mock Envoy and
//! scrapes it over HTTP.

mod common;

use common::{client_for, mount_healthy_envoy, production_document};
use envoy_exporter::envoy::{INVERTERS_PATH, PRODUCTION_PATH};
use envoy_exporter::server;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start the exporter in front of `envoy` and return its base URL
async fn start_exporter(envoy: &MockServer) -> String {
    let app = server::router(client_for(envoy));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    // Given: An exporter in front of a healthy Envoy
    let envoy = MockServer::start().await;
    mount_healthy_envoy(&envoy).await;
    let exporter = start_exporter(&envoy).await;

    // When: Scraping /metrics
    let response = reqwest::get(format!("{}/metrics", exporter)).await.unwrap();

    // Then: Output should be valid Prometheus format
    assert_eq!(response.status().as_u16(), 200);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = response.text().await.unwrap();
    assert!(body.contains("# HELP solar_apprnt_pwr Apparent power"));
    assert!(body.contains("# TYPE solar_wh_lifetime counter"));
    assert!(body.contains("# TYPE solar_w_now gauge"));
    assert!(body.contains("solar_w_now{meter=\"production\"} 2875.5"));
    assert!(body.contains("solar_w_now{meter=\"consumption\"} 1210.25"));
    assert!(body.contains("solar_inverter_last_report_watts{panel=\"121900000001\"} 251"));
    assert!(body.contains("solar_inverter_last_report_time{panel=\"121900000003\"} 1700000003"));
    assert!(!body.contains("net-consumption"));
}

#[tokio::test]
async fn test_metrics_endpoint_has_no_process_series() {
    // Given: An exporter in front of a healthy Envoy
    let envoy = MockServer::start().await;
    mount_healthy_envoy(&envoy).await;
    let exporter = start_exporter(&envoy).await;

    // When: Scraping /metrics
    let body = reqwest::get(format!("{}/metrics", exporter))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    // Then: Only solar_ series are exposed
    for line in body.lines().filter(|l| !l.starts_with('#')) {
        assert!(line.starts_with("solar_"), "unexpected series: {}", line);
    }
}

#[tokio::test]
async fn test_each_scrape_runs_one_cycle() {
    // Given: An exporter in front of a healthy Envoy
    let envoy = MockServer::start().await;
    mount_healthy_envoy(&envoy).await;
    let exporter = start_exporter(&envoy).await;

    // When: Scraping twice
    for _ in 0..2 {
        let status = reqwest::get(format!("{}/metrics", exporter))
            .await
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 200);
    }

    // Then: Each endpoint was polled once per scrape
    assert_eq!(common::requests_to(&envoy, PRODUCTION_PATH).await, 2);
    assert_eq!(common::requests_to(&envoy, INVERTERS_PATH).await, 2);
}

#[tokio::test]
async fn test_failed_cycle_returns_503_without_metrics() {
    // Given: Production succeeds but inverters always fail
    let envoy = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(production_document()))
        .mount(&envoy)
        .await;
    Mock::given(method("GET"))
        .and(path(INVERTERS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&envoy)
        .await;
    let exporter = start_exporter(&envoy).await;

    // When: Scraping /metrics
    let response = reqwest::get(format!("{}/metrics", exporter)).await.unwrap();

    // Then: The scrape fails and no partial series are returned
    assert_eq!(response.status().as_u16(), 503);
    let body = response.text().await.unwrap();
    assert!(!body.contains("solar_"));
    assert!(body.contains("500"));
}

#[tokio::test]
async fn test_health_and_root_endpoints() {
    // Given: An exporter whose Envoy is unreachable
    let envoy = MockServer::start().await;
    let exporter = start_exporter(&envoy).await;

    // When: Requesting /health and /
    let health = reqwest::get(format!("{}/health", exporter)).await.unwrap();
    let root = reqwest::get(format!("{}/", exporter)).await.unwrap();

    // Then: Both answer without touching the Envoy
    assert_eq!(health.status().as_u16(), 200);
    assert_eq!(health.text().await.unwrap(), "OK");
    assert_eq!(root.status().as_u16(), 200);
    assert!(root.text().await.unwrap().contains("/metrics"));
    assert!(envoy.received_requests().await.unwrap().is_empty());
}
