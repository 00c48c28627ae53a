//! Inverter Metrics Collector
//!
//! Collects the latest report of every micro-inverter.
//!
//! # Metrics Produced
//! - `solar_inverter_last_report_watts` - Watts reported by solar panel
//!   - Labels: panel
//! - `solar_inverter_last_report_time` - Time of last report
//!   - Labels: panel

use super::{number_field, string_field, INVERTERS_DOCUMENT};
use crate::error::{Result, SchemaError};
use crate::metrics::{MeasurementCatalog, INVERTER_SERIAL_FIELD, INVERTER_SERIES};
use serde_json::Value;
use tracing::debug;

/// Adds one sample per [`INVERTER_SERIES`] entry for every inverter, labeled by
/// serial number.
pub fn collect_inverter_metrics(inverters: &Value, catalog: &mut MeasurementCatalog) -> Result<()> {
    let inverters = inverters.as_array().ok_or_else(|| SchemaError::NotAnArray {
        document: INVERTERS_DOCUMENT,
        field: "(root)".to_string(),
    })?;

    for inverter in inverters {
        let serial = string_field(INVERTERS_DOCUMENT, inverter, INVERTER_SERIAL_FIELD)?;
        for def in &INVERTER_SERIES {
            let value = number_field(INVERTERS_DOCUMENT, inverter, def.field)?;
            catalog.push(def.name, serial, value)?;
        }
    }

    debug!("Collected {} inverters", inverters.len());
    Ok(())
}
