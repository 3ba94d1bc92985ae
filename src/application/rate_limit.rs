//! Fixed-window admission control per logical key.
//!
//! Counts requests per key (user id, IP, API token) inside fixed windows.
//! This is deliberately **not** a sliding window: a burst straddling the
//! boundary of two windows can momentarily admit close to twice the
//! configured rate within a short span. That is a known characteristic of
//! the fixed-window strategy, not a bug; callers who need smoothing should
//! size the window accordingly.

use crate::application::ports::Clock;
use crate::infrastructure::clock::SystemClock;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Configuration for a [`FixedWindowLimiter`].
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Requests admitted per key per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
        }
    }
}

/// Error returned when a rate limiter configuration is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimiterConfigError {
    /// Max requests must be greater than zero
    ZeroMaxRequests,
    /// Window must be non-zero
    ZeroWindow,
}

impl std::fmt::Display for RateLimiterConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateLimiterConfigError::ZeroMaxRequests => {
                write!(f, "max_requests must be greater than 0")
            }
            RateLimiterConfigError::ZeroWindow => write!(f, "window must be greater than 0"),
        }
    }
}

impl std::error::Error for RateLimiterConfigError {}

#[derive(Debug)]
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether this request is within the window's budget
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window rolls over
    pub resets_at: Instant,
}

/// Fixed-window request counter, one window per key.
///
/// Windows are created lazily on the first check for a key and never
/// proactively destroyed; call `reset` or `reset_all` to drop state.
///
/// # Example
/// ```
/// use resilience_toolkit::FixedWindowLimiter;
///
/// let limiter = FixedWindowLimiter::new();
/// let decision = limiter.check("user:42");
/// assert!(decision.allowed);
/// assert_eq!(decision.remaining, 99);
/// ```
#[derive(Debug)]
pub struct FixedWindowLimiter {
    windows: DashMap<String, RateWindow>,
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// Create a limiter with default configuration and the system clock.
    pub fn new() -> Self {
        Self::from_parts(RateLimiterConfig::default(), Arc::new(SystemClock::new()))
    }

    /// Create a limiter with custom configuration.
    pub fn with_config(config: RateLimiterConfig) -> Result<Self, RateLimiterConfigError> {
        Self::validate(&config)?;
        Ok(Self::from_parts(config, Arc::new(SystemClock::new())))
    }

    /// Create a limiter with custom configuration and clock (mainly for testing).
    pub fn with_config_and_clock(
        config: RateLimiterConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RateLimiterConfigError> {
        Self::validate(&config)?;
        Ok(Self::from_parts(config, clock))
    }

    fn validate(config: &RateLimiterConfig) -> Result<(), RateLimiterConfigError> {
        if config.max_requests == 0 {
            return Err(RateLimiterConfigError::ZeroMaxRequests);
        }
        if config.window.is_zero() {
            return Err(RateLimiterConfigError::ZeroWindow);
        }
        Ok(())
    }

    fn from_parts(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: DashMap::new(),
            config,
            clock,
        }
    }

    /// Count this request against the key's current window and decide.
    ///
    /// The read-then-increment runs under the key's map guard, so
    /// concurrent checks for the same key never interleave.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let mut window = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| RateWindow {
                count: 0,
                window_start: now,
            });

        if now.saturating_duration_since(window.window_start) >= self.config.window {
            window.count = 0;
            window.window_start = now;
        }
        window.count = window.count.saturating_add(1);

        let allowed = window.count <= self.config.max_requests;
        if !allowed {
            tracing::trace!(key, count = window.count, "rate limit exceeded");
        }

        RateLimitDecision {
            allowed,
            remaining: self.config.max_requests.saturating_sub(window.count),
            resets_at: window.window_start + self.config.window,
        }
    }

    /// Drop the window for one key. Returns whether one existed.
    pub fn reset(&self, key: &str) -> bool {
        self.windows.remove(key).is_some()
    }

    /// Drop every tracked window.
    pub fn reset_all(&self) {
        self.windows.clear();
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use std::thread;

    fn limiter_with_mock(config: RateLimiterConfig) -> (FixedWindowLimiter, Arc<MockClock>) {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let limiter = FixedWindowLimiter::with_config_and_clock(config, clock.clone()).unwrap();
        (limiter, clock)
    }

    fn small_config() -> RateLimiterConfig {
        RateLimiterConfig {
            max_requests: 3,
            window: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_allows_exactly_max_requests() {
        let (limiter, _clock) = limiter_with_mock(small_config());

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("user:1");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let denied = limiter.check("user:1");
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[test]
    fn test_window_rollover_resets_count() {
        let (limiter, clock) = limiter_with_mock(small_config());

        for _ in 0..4 {
            limiter.check("user:1");
        }
        assert!(!limiter.check("user:1").allowed);

        clock.advance(Duration::from_secs(60));
        let decision = limiter.check("user:1");
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 2);
    }

    #[test]
    fn test_resets_at_points_to_window_end() {
        let (limiter, clock) = limiter_with_mock(small_config());

        let started = clock.now();
        let decision = limiter.check("user:1");
        assert_eq!(decision.resets_at, started + Duration::from_secs(60));

        // resets_at stays fixed within the same window
        clock.advance(Duration::from_secs(30));
        let decision = limiter.check("user:1");
        assert_eq!(decision.resets_at, started + Duration::from_secs(60));
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _clock) = limiter_with_mock(small_config());

        for _ in 0..3 {
            assert!(limiter.check("user:1").allowed);
        }
        assert!(!limiter.check("user:1").allowed);

        // A different key has its own untouched budget
        assert!(limiter.check("user:2").allowed);
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_boundary_burst_is_a_documented_characteristic() {
        let (limiter, clock) = limiter_with_mock(small_config());

        // Fill the tail of one window...
        for _ in 0..3 {
            assert!(limiter.check("user:1").allowed);
        }
        // ...and the head of the next: 6 admitted inside a moment
        clock.advance(Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("user:1").allowed);
        }
    }

    #[test]
    fn test_reset_single_key() {
        let (limiter, _clock) = limiter_with_mock(small_config());

        for _ in 0..4 {
            limiter.check("user:1");
        }
        assert!(limiter.reset("user:1"));
        assert!(!limiter.reset("user:1"));

        assert!(limiter.check("user:1").allowed);
    }

    #[test]
    fn test_reset_all() {
        let (limiter, _clock) = limiter_with_mock(small_config());

        limiter.check("user:1");
        limiter.check("user:2");
        limiter.reset_all();
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            FixedWindowLimiter::with_config(RateLimiterConfig {
                max_requests: 0,
                ..RateLimiterConfig::default()
            })
            .err(),
            Some(RateLimiterConfigError::ZeroMaxRequests)
        );
        assert_eq!(
            FixedWindowLimiter::with_config(RateLimiterConfig {
                window: Duration::ZERO,
                ..RateLimiterConfig::default()
            })
            .err(),
            Some(RateLimiterConfigError::ZeroWindow)
        );
    }

    #[test]
    fn test_concurrent_checks_never_over_admit() {
        let limiter = Arc::new(
            FixedWindowLimiter::with_config(RateLimiterConfig {
                max_requests: 50,
                window: Duration::from_secs(60),
            })
            .unwrap(),
        );
        let mut handles = vec![];

        for _ in 0..10 {
            let limiter = Arc::clone(&limiter);
            handles.push(thread::spawn(move || {
                (0..20).filter(|_| limiter.check("shared").allowed).count()
            }));
        }

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 50);
    }
}
