//! Error types for the appsign core.

/// Core error type for identifiers, time values and configuration.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An identifier was empty or padded with whitespace.
    #[error("invalid {kind}: must be a non-empty string without surrounding whitespace")]
    InvalidIdentifier {
        /// Which identifier was rejected (e.g. `space id`).
        kind: &'static str,
    },

    /// A timestamp at or before the 2020-01-01 baseline.
    #[error("invalid timestamp: {0} (must be epoch milliseconds after 2020-01-01T00:00:00Z)")]
    InvalidTimestamp(i64),

    /// A negative time-to-live.
    #[error("invalid time to live: {0} (must be zero or positive milliseconds)")]
    InvalidTimeToLive(i64),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
