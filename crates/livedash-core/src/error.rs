//! Error taxonomy for the dashboard engine.
//!
//! Transport and server failures replace the whole dashboard with a single
//! message; conversion failures only degrade the metric they belong to.

use thiserror::Error;

/// Failure reported by the transport layer before any payload is parsed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum DashError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("server reported failure: {0}")]
    ServerReported(String),
    #[error("value #{index} is {found}, expected {expected}")]
    Conversion {
        index: usize,
        expected: &'static str,
        found: String,
    },
    #[error("chart needs numeric values")]
    NonNumeric,
    #[error("image metric needs a string URL")]
    NonText,
    #[error("metric has no values")]
    EmptyValues,
    #[error("literal text metric has no text")]
    MissingText,
    #[error("screen location {0} is outside 1..=4")]
    InvalidSlot(i64),
    #[error("unsupported visual kind '{0}'")]
    UnsupportedVisual(String),
    #[error("image decode failed: {0}")]
    ImageDecode(String),
    #[error("invalid input '{0}': expected a number")]
    InvalidInput(String),
    #[error("no modifiable metric at dropdown position {0}")]
    NoSelection(usize),
    #[error("mutation rejected: {0}")]
    Mutation(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashError>;
