// Error kinds for the analytics engine.
//
// Per-event errors (GeoError) are recovered inside the pipeline: the event is
// dropped from spatial outputs and counted. ConfigError is fatal and raised
// before any scoring happens. EngineError wraps whatever can abort a recompute.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to place a single event on the map.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    #[error("could not resolve location '{location}'")]
    Resolution { location: String },

    #[error("coordinates out of range: ({latitude}, {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

/// Rejected configuration. Nothing is computed with an invalid config.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("signal weights must sum to 1.0 (got {sum:.4})")]
    WeightSum { sum: f64 },

    #[error("weight '{name}' must be within [0, 1] (got {value})")]
    WeightRange { name: &'static str, value: f64 },

    #[error("thresholds must satisfy 100 >= high > medium >= 0 (high={high}, medium={medium})")]
    ThresholdOrder { high: f64, medium: f64 },

    #[error("'{name}' must be positive (got {value})")]
    NotPositive { name: &'static str, value: f64 },

    #[error("'{name}' must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("surge_trailing_buckets must be at least 1")]
    NoTrailingBuckets,

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },
}

/// Anything that aborts a full recompute.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("dataset contains no events")]
    EmptyDataset,

    #[error("timeline would need {needed} buckets (limit {limit}); widen the window")]
    BucketLimit { needed: u64, limit: u64 },

    #[error("timeline bucket {bucket} falls outside the representable time range")]
    TimeRange { bucket: usize },
}

/// Dataset loading failures (CLI side of the engine boundary).
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record at line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed dataset: {0}")]
    Json(#[from] serde_json::Error),
}
