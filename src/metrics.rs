//! Prometheus Metrics Definitions
//!
//! This module defines every series the Envoy exporter exposes and the
//! [`MeasurementCatalog`] a collection cycle fills in.
//!
//! # Metric Categories
//!
//! ## Meter Metrics (label `meter`)
//! - Apparent, reactive and real power plus power factor
//! - Volt-amp-hours and volt-amp-reactive-hours, today and lifetime
//! - Watt-hours today, over the last seven days and lifetime
//!
//! ## Inverter Metrics (label `panel`)
//! - Last reported wattage and report time per micro-inverter
//!
//! # Metric Types
//!
//! - **Gauge**: point-in-time or daily-resetting values (e.g. `solar_w_now`)
//! - **Counter**: lifetime accumulations kept by the device (e.g. `solar_wh_lifetime`)
//!
//! All metrics use the `solar_` prefix.
//!
//! A catalog is built from scratch for every scrape and rendered through a
//! throwaway [`Registry`], so nothing is carried over between scrapes and no
//! process-level default series ever show up in the output.

use crate::error::{ExporterError, Result};
use prometheus::core::{Collector, Desc};
use prometheus::{proto, Encoder, Registry, TextEncoder};
use std::collections::HashMap;
use std::fmt;

/// Prometheus metric type of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Which label a series is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// `production` or `consumption`
    Meter,
    /// Inverter serial number
    Panel,
}

impl LabelKind {
    pub fn label_name(&self) -> &'static str {
        match self {
            LabelKind::Meter => "meter",
            LabelKind::Panel => "panel",
        }
    }
}

/// Measurement point of the shared meter series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meter {
    Production,
    Consumption,
}

impl Meter {
    pub const ALL: [Meter; 2] = [Meter::Production, Meter::Consumption];

    /// Label value on exported series, also the array in `production.json`
    /// holding this meter's entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Meter::Production => "production",
            Meter::Consumption => "consumption",
        }
    }

    /// `measurementType` of the entry that feeds this meter. Net consumption and
    /// any per-phase sub-meters are left out.
    pub fn measurement_type(&self) -> &'static str {
        match self {
            Meter::Production => "production",
            Meter::Consumption => "total-consumption",
        }
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sample value exactly as the device reported it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl SampleValue {
    /// Converts a JSON number without losing its integer/float flavour.
    pub fn from_number(number: &serde_json::Number) -> Option<Self> {
        if let Some(v) = number.as_u64() {
            Some(SampleValue::UInt(v))
        } else if let Some(v) = number.as_i64() {
            Some(SampleValue::Int(v))
        } else {
            number.as_f64().map(SampleValue::Float)
        }
    }

    /// The exposition format only carries floats.
    pub fn as_f64(&self) -> f64 {
        match *self {
            SampleValue::Int(v) => v as f64,
            SampleValue::UInt(v) => v as f64,
            SampleValue::Float(v) => v,
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Int(v) => write!(f, "{}", v),
            SampleValue::UInt(v) => write!(f, "{}", v),
            SampleValue::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Static description of one exported series and the JSON field feeding it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesDef {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub label: LabelKind,
    pub field: &'static str,
}

const fn meter_series(
    name: &'static str,
    help: &'static str,
    kind: MetricKind,
    field: &'static str,
) -> SeriesDef {
    SeriesDef {
        name,
        help,
        kind,
        label: LabelKind::Meter,
        field,
    }
}

/// Series filled once per contributing `production.json` entry
pub const METER_SERIES: [SeriesDef; 13] = [
    meter_series("solar_apprnt_pwr", "Apparent power", MetricKind::Gauge, "apprntPwr"),
    meter_series("solar_pwr_factor", "Power factor", MetricKind::Gauge, "pwrFactor"),
    meter_series("solar_react_pwr", "Reactive power", MetricKind::Gauge, "reactPwr"),
    meter_series("solar_vah_today", "Volt-amp-hours today", MetricKind::Gauge, "vahToday"),
    meter_series(
        "solar_vah_lifetime",
        "Volt-amp-hours lifetime",
        MetricKind::Counter,
        "vahLifetime",
    ),
    meter_series(
        "solar_varh_lag_today",
        "Volt-amp-reactive-hours lag today",
        MetricKind::Gauge,
        "varhLagToday",
    ),
    meter_series(
        "solar_varh_lag_lifetime",
        "Volt-amp-reactive-hours lag lifetime",
        MetricKind::Counter,
        "varhLagLifetime",
    ),
    meter_series(
        "solar_varh_lead_today",
        "Volt-amp-reactive-hours lead today",
        MetricKind::Gauge,
        "varhLeadToday",
    ),
    meter_series(
        "solar_varh_lead_lifetime",
        "Volt-amp-reactive-hours lead lifetime",
        MetricKind::Counter,
        "varhLeadLifetime",
    ),
    meter_series("solar_w_now", "Current watts", MetricKind::Gauge, "wNow"),
    meter_series("solar_wh_today", "Watt-hours today", MetricKind::Gauge, "whToday"),
    meter_series(
        "solar_wh_last7days",
        "Watt-hours last seven days",
        MetricKind::Gauge,
        "whLastSevenDays",
    ),
    meter_series(
        "solar_wh_lifetime",
        "Watt-hours lifetime",
        MetricKind::Counter,
        "whLifetime",
    ),
];

/// Series filled once per inverter
pub const INVERTER_SERIES: [SeriesDef; 2] = [
    SeriesDef {
        name: "solar_inverter_last_report_watts",
        help: "Watts reported by solar panel",
        kind: MetricKind::Gauge,
        label: LabelKind::Panel,
        field: "lastReportWatts",
    },
    SeriesDef {
        name: "solar_inverter_last_report_time",
        help: "Time of last report",
        kind: MetricKind::Gauge,
        label: LabelKind::Panel,
        field: "lastReportDate",
    },
];

/// Field carrying the inverter serial, used as the `panel` label value
pub const INVERTER_SERIAL_FIELD: &str = "serialNumber";

/// One labeled value of a series
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: String,
    pub value: SampleValue,
}

/// A series and the samples gathered for it in the current cycle
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub def: SeriesDef,
    pub samples: Vec<Sample>,
}

impl Series {
    fn empty(def: SeriesDef) -> Self {
        Self {
            def,
            samples: Vec::new(),
        }
    }

    /// Samples whose label equals `label`
    pub fn samples_for<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Sample> + 'a {
        self.samples.iter().filter(move |s| s.label == label)
    }
}

/// Every exported series with the samples of one collection cycle
///
/// Always holds all fifteen series, in table order; a series without samples is
/// simply not rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementCatalog {
    series: Vec<Series>,
}

impl MeasurementCatalog {
    pub fn new() -> Self {
        let series = METER_SERIES
            .iter()
            .chain(INVERTER_SERIES.iter())
            .copied()
            .map(Series::empty)
            .collect();
        Self { series }
    }

    pub fn series(&self) -> &[Series] {
        &self.series
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.def.name == name)
    }

    /// Append a sample to the series called `name`.
    ///
    /// Names come from the static tables; an unknown one is reported rather
    /// than dropped.
    pub fn push(&mut self, name: &str, label: &str, value: SampleValue) -> Result<()> {
        let series = self
            .series
            .iter_mut()
            .find(|s| s.def.name == name)
            .ok_or_else(|| ExporterError::UnknownSeries(name.to_string()))?;

        series.samples.push(Sample {
            label: label.to_string(),
            value,
        });
        Ok(())
    }

    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|s| s.samples.len()).sum()
    }

    /// Register every series in a fresh registry and encode it in the
    /// Prometheus text format.
    ///
    /// Values are written as reported, so a device counter that went negative
    /// or two entries sharing a label both show up unchanged.
    pub fn render(&self) -> Result<String> {
        let registry = Registry::new();
        registry.register(Box::new(SnapshotCollector::new(self)?))?;

        let encoder = TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ExporterError::Render(e.to_string()))
    }
}

/// Hands the samples of one cycle to a [`Registry`] as ready-made families,
/// one metric per sample, without merging repeated labels.
struct SnapshotCollector {
    descs: Vec<Desc>,
    families: Vec<proto::MetricFamily>,
}

impl SnapshotCollector {
    fn new(catalog: &MeasurementCatalog) -> Result<Self> {
        let mut descs = Vec::with_capacity(catalog.series.len());
        let mut families = Vec::with_capacity(catalog.series.len());

        for series in &catalog.series {
            let def = &series.def;
            descs.push(Desc::new(
                def.name.to_string(),
                def.help.to_string(),
                vec![def.label.label_name().to_string()],
                HashMap::new(),
            )?);

            // Empty families are pruned on gather.
            let mut family = proto::MetricFamily::default();
            family.set_name(def.name.to_string());
            family.set_help(def.help.to_string());
            family.set_field_type(match def.kind {
                MetricKind::Gauge => proto::MetricType::GAUGE,
                MetricKind::Counter => proto::MetricType::COUNTER,
            });
            family.set_metric(
                series
                    .samples
                    .iter()
                    .map(|sample| sample_metric(def, sample))
                    .collect(),
            );
            families.push(family);
        }

        Ok(Self { descs, families })
    }
}

fn sample_metric(def: &SeriesDef, sample: &Sample) -> proto::Metric {
    let mut label = proto::LabelPair::default();
    label.set_name(def.label.label_name().to_string());
    label.set_value(sample.label.clone());

    let mut metric = proto::Metric::from_label(vec![label]);
    match def.kind {
        MetricKind::Gauge => {
            let mut gauge = proto::Gauge::default();
            gauge.set_value(sample.value.as_f64());
            metric.set_gauge(gauge);
        }
        MetricKind::Counter => {
            let mut counter = proto::Counter::default();
            counter.set_value(sample.value.as_f64());
            metric.set_counter(counter);
        }
    }
    metric
}

impl Collector for SnapshotCollector {
    fn desc(&self) -> Vec<&Desc> {
        self.descs.iter().collect()
    }

    fn collect(&self) -> Vec<proto::MetricFamily> {
        self.families.clone()
    }
}

impl Default for MeasurementCatalog {
    fn default() -> Self {
        Self::new()
    }
}
