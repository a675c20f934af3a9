//! Errors surfaced by the admission services.
//!
//! Denial is not an error: admission decisions come back as `Ok(false)`.
//! Only malformed input or operations against missing state fail.

/// Error returned by limiter operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimiterError {
    /// The caller-supplied key is empty. Raised before any limiter
    /// state is touched or created.
    InvalidKey,
    /// The operation requires an existing instance for the key and
    /// none exists. Raised without creating one.
    UnknownKey(String),
}

impl std::fmt::Display for LimiterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimiterError::InvalidKey => write!(f, "key must not be empty"),
            LimiterError::UnknownKey(key) => {
                write!(f, "no limiter state exists for key `{}`", key)
            }
        }
    }
}

impl std::error::Error for LimiterError {}
