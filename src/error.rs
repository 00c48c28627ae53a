use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Envoy returned status {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Envoy returned invalid JSON for {url}: {source}")]
    InvalidJson {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected Envoy payload: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to render metrics: {0}")]
    Render(String),

    #[error("Unknown series: {0}")]
    UnknownSeries(String),

    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

impl ExporterError {
    /// Whether another attempt against the device could succeed.
    ///
    /// Network failures and non-2xx responses are retried; a body that is not
    /// JSON, or JSON of the wrong shape, will not change on the next attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExporterError::Http(_) | ExporterError::Status { .. })
    }
}

/// A field or sequence the transform needs is missing from an Envoy document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{document}: expected `{field}` to be an array")]
    NotAnArray {
        document: &'static str,
        field: String,
    },

    #[error("{document}: missing field `{field}`")]
    MissingField {
        document: &'static str,
        field: String,
    },

    #[error("{document}: field `{field}` has wrong type, expected {expected}")]
    WrongType {
        document: &'static str,
        field: String,
        expected: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ExporterError>;
