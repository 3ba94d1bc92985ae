//! Exponential backoff with jitter for retry scheduling.
//!
//! The calculator is a pure function of the attempt number and a
//! [`BackoffConfig`]; exhausted retries are a normal terminal condition
//! signalled by `None`, not an error.

use rand::Rng;
use std::time::Duration;

/// Configuration for exponential backoff.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Number of attempts before giving up
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound applied to every computed delay
    pub max_delay: Duration,
    /// Multiplier applied per attempt
    pub factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            factor: 2.0,
        }
    }
}

/// Error returned when a backoff configuration is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffConfigError {
    /// Base delay must be non-zero
    ZeroBaseDelay,
    /// Max delay must be non-zero
    ZeroMaxDelay,
    /// Factor below 1.0 would shrink delays instead of growing them
    FactorBelowOne,
}

impl std::fmt::Display for BackoffConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackoffConfigError::ZeroBaseDelay => write!(f, "base_delay must be greater than 0"),
            BackoffConfigError::ZeroMaxDelay => write!(f, "max_delay must be greater than 0"),
            BackoffConfigError::FactorBelowOne => write!(f, "factor must be at least 1.0"),
        }
    }
}

impl std::error::Error for BackoffConfigError {}

impl BackoffConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), BackoffConfigError> {
        if self.base_delay.is_zero() {
            return Err(BackoffConfigError::ZeroBaseDelay);
        }
        if self.max_delay.is_zero() {
            return Err(BackoffConfigError::ZeroMaxDelay);
        }
        if self.factor < 1.0 || !self.factor.is_finite() {
            return Err(BackoffConfigError::FactorBelowOne);
        }
        Ok(())
    }
}

/// Compute the delay before the given retry attempt.
///
/// Returns `None` once `attempt >= max_retries`, signalling that the caller
/// should stop retrying. Otherwise the delay is
/// `base_delay * factor^attempt`, plus jitter uniformly drawn from
/// `[0, 0.25 * delay]`, capped at `max_delay`.
///
/// # Example
/// ```
/// use resilience_toolkit::{calculate_backoff, BackoffConfig};
/// use std::time::Duration;
///
/// let config = BackoffConfig::default();
/// let delay = calculate_backoff(0, &config).unwrap();
/// assert!(delay >= Duration::from_secs(1));
/// assert!(calculate_backoff(3, &config).is_none());
/// ```
pub fn calculate_backoff(attempt: u32, config: &BackoffConfig) -> Option<Duration> {
    if attempt >= config.max_retries {
        return None;
    }

    let raw = config.base_delay.as_secs_f64() * config.factor.powi(attempt as i32);
    let cap = config.max_delay.as_secs_f64();
    if !raw.is_finite() || raw >= cap {
        return Some(config.max_delay);
    }

    // Jitter breaks retry synchronization across clients.
    let jitter = raw * rand::thread_rng().gen_range(0.0..=0.25);
    Some(Duration::from_secs_f64((raw + jitter).min(cap)))
}

/// Whether another retry attempt should be made.
///
/// Independent of the delay calculation; callers may use one or both.
pub fn should_retry(attempt: u32, config: &BackoffConfig) -> bool {
    attempt < config.max_retries
}
