//! Metrics Collectors
//!
//! This module turns the two Envoy documents into a [`MeasurementCatalog`].
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - [`collect`] runs one collection cycle: fetch both documents, then transform
//! - [`transform`] is pure and hands each document to its collector
//! - [`meter`] and [`inverter`] walk the static series tables in
//!   [`crate::metrics`] and pull one JSON field per series
//!
//! # Error Handling
//!
//! A cycle is all-or-nothing. A failed fetch or a document missing an expected
//! field fails the whole cycle, and no partial catalog is handed out.

use crate::envoy::EnvoyClient;
use crate::error::{Result, SchemaError};
use crate::metrics::{MeasurementCatalog, SampleValue};
use serde_json::Value;
use std::time::Instant;
use tracing::info;

pub mod inverter;
pub mod meter;

pub use inverter::collect_inverter_metrics;
pub use meter::collect_meter_metrics;

/// Name used for `production.json` in schema errors
pub const PRODUCTION_DOCUMENT: &str = "production";

/// Name used for the inverters document in schema errors
pub const INVERTERS_DOCUMENT: &str = "inverters";

/// Run one collection cycle against the Envoy.
///
/// Both documents are fetched sequentially; the logged duration covers the two
/// fetches only.
pub async fn collect(client: &EnvoyClient) -> Result<MeasurementCatalog> {
    let started = Instant::now();
    let production = client.production().await?;
    let inverters = client.inverters().await?;
    info!(
        "Successfully polled the Envoy in {:.4} seconds",
        started.elapsed().as_secs_f64()
    );

    transform(&production, &inverters)
}

/// Build the catalog from an aggregate production document and an inverters
/// document.
pub fn transform(production: &Value, inverters: &Value) -> Result<MeasurementCatalog> {
    let mut catalog = MeasurementCatalog::new();
    collect_inverter_metrics(inverters, &mut catalog)?;
    collect_meter_metrics(production, &mut catalog)?;
    Ok(catalog)
}

/// Look up `field` on `value` and require it to be an array.
pub(crate) fn array_field<'a>(
    document: &'static str,
    value: &'a Value,
    field: &str,
) -> std::result::Result<&'a [Value], SchemaError> {
    let found = value
        .get(field)
        .ok_or_else(|| SchemaError::MissingField {
            document,
            field: field.to_string(),
        })?;

    found
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| SchemaError::NotAnArray {
            document,
            field: field.to_string(),
        })
}

pub(crate) fn number_field(
    document: &'static str,
    entry: &Value,
    field: &str,
) -> std::result::Result<SampleValue, SchemaError> {
    match entry.get(field) {
        Some(Value::Number(n)) => SampleValue::from_number(n).ok_or_else(|| {
            SchemaError::WrongType {
                document,
                field: field.to_string(),
                expected: "number",
            }
        }),
        Some(_) => Err(SchemaError::WrongType {
            document,
            field: field.to_string(),
            expected: "number",
        }),
        None => Err(SchemaError::MissingField {
            document,
            field: field.to_string(),
        }),
    }
}

pub(crate) fn string_field<'a>(
    document: &'static str,
    entry: &'a Value,
    field: &str,
) -> std::result::Result<&'a str, SchemaError> {
    match entry.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(SchemaError::WrongType {
            document,
            field: field.to_string(),
            expected: "string",
        }),
        None => Err(SchemaError::MissingField {
            document,
            field: field.to_string(),
        }),
    }
}
