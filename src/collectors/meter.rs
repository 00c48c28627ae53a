//! Meter Metrics Collector
//!
//! Collects production and consumption meter readings from `production.json`.
//!
//! # Metrics Produced
//! - Every series in [`METER_SERIES`], e.g. `solar_w_now` or `solar_wh_lifetime`
//!   - Labels: meter (production, consumption)
//!
//! Only the entry measuring overall production and the entry measuring total
//! consumption are read. Net consumption and any other sub-meter entries are
//! skipped.

use super::{array_field, number_field, PRODUCTION_DOCUMENT};
use crate::error::Result;
use crate::metrics::{MeasurementCatalog, Meter, METER_SERIES};
use serde_json::Value;
use tracing::debug;

/// Adds one sample per [`METER_SERIES`] entry for every contributing meter entry
///
/// # Arguments
///
/// * `production` - the `production.json` document
/// * `catalog` - catalog of the current cycle
///
/// # Returns
///
/// * `Ok(())` - all contributing entries were added
/// * `Err(_)` - a meter array or a numeric field is missing
pub fn collect_meter_metrics(production: &Value, catalog: &mut MeasurementCatalog) -> Result<()> {
    for meter in Meter::ALL {
        let entries = array_field(PRODUCTION_DOCUMENT, production, meter.as_str())?;

        let mut contributing = 0usize;
        for entry in entries.iter().filter(|e| is_contributing(meter, e)) {
            for def in &METER_SERIES {
                let value = number_field(PRODUCTION_DOCUMENT, entry, def.field)?;
                catalog.push(def.name, meter.as_str(), value)?;
            }
            contributing += 1;
        }

        debug!(
            "{} of {} {} entries contributed",
            contributing,
            entries.len(),
            meter
        );
    }

    Ok(())
}

fn is_contributing(meter: Meter, entry: &Value) -> bool {
    entry.get("measurementType").and_then(Value::as_str) == Some(meter.measurement_type())
}
