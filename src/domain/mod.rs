//! Domain layer - the admission algorithms themselves.
//!
//! Each algorithm owns its mutable counters and timestamps behind a
//! per-instance lock and takes the current time in milliseconds as an
//! explicit argument, so this layer has no clock dependency and is
//! fully deterministic under test.

pub mod adaptive;
pub mod burst;
pub mod circuit_breaker;
pub mod ema;
pub mod fixed_window;
pub mod leaky_bucket;
pub mod quota;
pub mod sliding_window_counter;
pub mod sliding_window_log;
pub mod token_bucket;

/// Error returned when an algorithm configuration fails validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Time period must be greater than zero
    ZeroPeriod,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroPeriod => {
                write!(f, "time period must be greater than 0")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
