use thiserror::Error;

/// Convenient result alias for the weatherary library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a propagation header carries a version other than `1`.
    #[error("unsupported trace header version {version:?}")]
    UnsupportedTraceVersion { version: String },

    /// Raised when a propagation header lacks a required key.
    #[error("trace header is missing required field {field}")]
    MissingTraceField { field: &'static str },

    /// Raised when the `context` section of a propagation header cannot be decoded.
    #[error("trace header context is malformed: {reason}")]
    MalformedTraceContext { reason: String },

    /// Raised when a propagation header field cannot be decoded.
    #[error("trace header field {field} is malformed: {reason}")]
    MalformedTraceField { field: &'static str, reason: String },

    /// Raised when a weather catalog would contain no phrases.
    #[error("weather catalog must contain at least one phrase")]
    EmptyCatalog,

    /// Raised when a configuration value cannot be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// Raised when the tracing backend rejects an exported batch.
    #[error("span export rejected with status {status}: {body}")]
    Export { status: u16, body: String },

    /// Transport error talking to the tracing backend.
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
