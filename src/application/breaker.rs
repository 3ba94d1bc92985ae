//! Circuit breaker for failing downstream dependencies.
//!
//! Stops hammering a dependency that keeps failing and allows a bounded
//! number of recovery probes once a cooldown has elapsed. The breaker never
//! errors at runtime; it only tells the caller whether to attempt the call,
//! and the caller reports the outcome through the two recording operations.
//!
//! There is no background timer: time-driven transitions are evaluated
//! lazily on every externally visible read, so the breaker is safe to use
//! as a read-mostly, on-demand gate.

use crate::application::ports::Clock;
use crate::infrastructure::clock::SystemClock;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation, calls pass through
    Closed,
    /// Rejecting all calls until the reset timeout elapses
    Open,
    /// Allowing a limited number of recovery probes
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// How long the circuit stays open before allowing probes
    pub reset_timeout: Duration,
    /// Probes allowed (and successes required) while half-open
    pub half_open_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
            half_open_requests: 3,
        }
    }
}

/// Error returned when a circuit breaker configuration is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerConfigError {
    /// Failure threshold must be greater than zero
    ZeroFailureThreshold,
    /// Half-open probe budget must be greater than zero
    ZeroHalfOpenRequests,
    /// Reset timeout must be non-zero
    ZeroResetTimeout,
}

impl std::fmt::Display for BreakerConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerConfigError::ZeroFailureThreshold => {
                write!(f, "failure_threshold must be greater than 0")
            }
            BreakerConfigError::ZeroHalfOpenRequests => {
                write!(f, "half_open_requests must be greater than 0")
            }
            BreakerConfigError::ZeroResetTimeout => {
                write!(f, "reset_timeout must be greater than 0")
            }
        }
    }
}

impl std::error::Error for BreakerConfigError {}

impl CircuitBreakerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), BreakerConfigError> {
        if self.failure_threshold == 0 {
            return Err(BreakerConfigError::ZeroFailureThreshold);
        }
        if self.half_open_requests == 0 {
            return Err(BreakerConfigError::ZeroHalfOpenRequests);
        }
        if self.reset_timeout.is_zero() {
            return Err(BreakerConfigError::ZeroResetTimeout);
        }
        Ok(())
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_failure_at: Option<Instant>,
    total_requests: u64,
    total_failures: u64,
    half_open_probes: u32,
}

/// Point-in-time copy of a breaker's state.
///
/// Produced after the lazy transition rule has run, so time-driven
/// transitions are visible to any observer, not only callers of
/// `can_execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    /// Current state
    pub state: CircuitState,
    /// Failures since the last success while closed
    pub consecutive_failures: u32,
    /// Probe successes while half-open
    pub consecutive_successes: u32,
    /// When the most recent failure was recorded
    pub last_failure_at: Option<Instant>,
    /// Outcomes recorded over the breaker's lifetime
    pub total_requests: u64,
    /// Failures recorded over the breaker's lifetime
    pub total_failures: u64,
    /// Probes issued in the current half-open period
    pub half_open_probes: u32,
}

/// Three-state failure gate for one downstream dependency.
///
/// Typically created once per dependency and shared across request workers;
/// every operation is a single critical section behind one mutex.
///
/// # Example
/// ```
/// use resilience_toolkit::{CircuitBreaker, CircuitState};
///
/// let breaker = CircuitBreaker::new();
/// if breaker.can_execute() {
///     // ... attempt the downstream call ...
///     breaker.record_success();
/// }
/// assert_eq!(breaker.state(), CircuitState::Closed);
/// ```
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    config: CircuitBreakerConfig,
    clock: Arc<dyn Clock>,
}

impl CircuitBreaker {
    /// Create a breaker with default configuration and the system clock.
    pub fn new() -> Self {
        Self::from_parts(CircuitBreakerConfig::default(), Arc::new(SystemClock::new()))
    }

    /// Create a breaker with custom configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Result<Self, BreakerConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config, Arc::new(SystemClock::new())))
    }

    /// Create a breaker with custom configuration and clock (mainly for testing).
    pub fn with_config_and_clock(
        config: CircuitBreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, BreakerConfigError> {
        config.validate()?;
        Ok(Self::from_parts(config, clock))
    }

    fn from_parts(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                consecutive_successes: 0,
                last_failure_at: None,
                total_requests: 0,
                total_failures: 0,
                half_open_probes: 0,
            }),
            config,
            clock,
        }
    }

    /// Apply the lazy transition rule: an open circuit whose reset timeout
    /// has elapsed becomes half-open with a fresh probe budget.
    fn poll_transition(&self, inner: &mut BreakerInner) {
        if inner.state != CircuitState::Open {
            return;
        }
        let elapsed_since_failure = inner
            .last_failure_at
            .map(|at| self.clock.now().saturating_duration_since(at));
        if matches!(elapsed_since_failure, Some(elapsed) if elapsed >= self.config.reset_timeout) {
            inner.state = CircuitState::HalfOpen;
            inner.half_open_probes = 0;
            inner.consecutive_successes = 0;
            tracing::debug!("circuit breaker half-open, allowing recovery probes");
        }
    }

    /// Whether the caller should attempt the downstream call.
    ///
    /// Closed circuits always allow; open circuits reject until the reset
    /// timeout elapses; half-open circuits allow up to `half_open_requests`
    /// probes, counting this call as one when it is admitted.
    pub fn can_execute(&self) -> bool {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.poll_transition(&mut inner);

        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if inner.half_open_probes < self.config.half_open_requests {
                    inner.half_open_probes += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful downstream outcome.
    ///
    /// Safe to call in any state, including right after `reset`.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.total_requests += 1;

        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.consecutive_successes += 1;
                if inner.consecutive_successes >= self.config.half_open_requests {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.consecutive_successes = 0;
                    inner.half_open_probes = 0;
                    tracing::info!("circuit breaker closed after successful recovery probes");
                }
            }
            CircuitState::Open => {
                // Late success from a call issued before the circuit opened.
            }
        }
    }

    /// Record a failed downstream outcome.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.total_requests += 1;
        inner.total_failures += 1;
        inner.consecutive_failures += 1;
        inner.last_failure_at = Some(self.clock.now());

        let should_open = inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.config.failure_threshold;
        if should_open && inner.state != CircuitState::Open {
            inner.state = CircuitState::Open;
            tracing::warn!(
                consecutive_failures = inner.consecutive_failures,
                "circuit breaker opened"
            );
        }
    }

    /// Current state, after applying the lazy transition rule.
    pub fn state(&self) -> CircuitState {
        self.snapshot().state
    }

    /// Copy of the full breaker state, after applying the lazy transition rule.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.poll_transition(&mut inner);

        CircuitSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            consecutive_successes: inner.consecutive_successes,
            last_failure_at: inner.last_failure_at,
            total_requests: inner.total_requests,
            total_failures: inner.total_failures,
            half_open_probes: inner.half_open_probes,
        }
    }

    /// Force the breaker back to closed and zero every counter.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        *inner = BreakerInner {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_failure_at: None,
            total_requests: 0,
            total_failures: 0,
            half_open_probes: 0,
        };
    }

    /// The configuration this breaker was built with.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;
    use std::thread;

    fn breaker_with_mock(config: CircuitBreakerConfig) -> (CircuitBreaker, Arc<MockClock>) {
        let clock = Arc::new(MockClock::new(Instant::now()));
        let breaker = CircuitBreaker::with_config_and_clock(config, clock.clone()).unwrap();
        (breaker, clock)
    }

    fn quick_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            reset_timeout: Duration::from_millis(1000),
            half_open_requests: 3,
        }
    }

    #[test]
    fn test_initial_state() {
        let breaker = CircuitBreaker::new();
        let snapshot = breaker.snapshot();

        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.total_requests, 0);
        assert!(breaker.can_execute());
    }

    #[test]
    fn test_opens_at_failure_threshold() {
        let (breaker, _clock) = breaker_with_mock(quick_config());

        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());
    }

    #[test]
    fn test_success_resets_failure_streak() {
        let (breaker, _clock) = breaker_with_mock(quick_config());

        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        assert_eq!(breaker.snapshot().consecutive_failures, 0);

        // Streak starts over; two more failures are not enough
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_after_reset_timeout() {
        let (breaker, clock) = breaker_with_mock(quick_config());

        for _ in 0..3 {
            breaker.record_failure();
        }
        assert!(!breaker.can_execute());

        clock.advance(Duration::from_millis(999));
        assert!(!breaker.can_execute());

        clock.advance(Duration::from_millis(1));
        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_time_transition_visible_without_can_execute() {
        let (breaker, clock) = breaker_with_mock(quick_config());

        for _ in 0..3 {
            breaker.record_failure();
        }
        clock.advance(Duration::from_millis(1000));

        // Observing state alone must surface the transition
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_probe_budget() {
        let (breaker, clock) = breaker_with_mock(quick_config());

        for _ in 0..3 {
            breaker.record_failure();
        }
        clock.advance(Duration::from_millis(1000));

        // Budget of 3 probes, then rejected until an outcome arrives
        assert!(breaker.can_execute());
        assert!(breaker.can_execute());
        assert!(breaker.can_execute());
        assert!(!breaker.can_execute());
        assert_eq!(breaker.snapshot().half_open_probes, 3);
    }

    #[test]
    fn test_probe_successes_close_circuit() {
        let (breaker, clock) = breaker_with_mock(quick_config());

        for _ in 0..3 {
            breaker.record_failure();
        }
        clock.advance(Duration::from_millis(1000));
        assert!(breaker.can_execute());

        breaker.record_success();
        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success();
        let snapshot = breaker.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.half_open_probes, 0);
    }

    #[test]
    fn test_failure_during_half_open_reopens() {
        let (breaker, clock) = breaker_with_mock(quick_config());

        for _ in 0..3 {
            breaker.record_failure();
        }
        clock.advance(Duration::from_millis(1000));
        assert!(breaker.can_execute());

        // A single probe failure trips the circuit again immediately
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());

        // And the cooldown starts over from the new failure
        clock.advance(Duration::from_millis(1000));
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_totals_accumulate() {
        let (breaker, _clock) = breaker_with_mock(quick_config());

        breaker.record_success();
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();

        let snapshot = breaker.snapshot();
        assert_eq!(snapshot.total_requests, 4);
        assert_eq!(snapshot.total_failures, 2);
    }

    #[test]
    fn test_reset_zeroes_everything() {
        let (breaker, _clock) = breaker_with_mock(quick_config());

        for _ in 0..3 {
            breaker.record_failure();
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        breaker.reset();
        let snapshot = breaker.snapshot();
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.total_requests, 0);
        assert_eq!(snapshot.last_failure_at, None);
        assert!(breaker.can_execute());

        // Recording on a freshly reset breaker is safe
        breaker.record_success();
        assert_eq!(breaker.snapshot().total_requests, 1);
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            CircuitBreaker::with_config(CircuitBreakerConfig {
                failure_threshold: 0,
                ..CircuitBreakerConfig::default()
            })
            .err(),
            Some(BreakerConfigError::ZeroFailureThreshold)
        );
        assert_eq!(
            CircuitBreaker::with_config(CircuitBreakerConfig {
                half_open_requests: 0,
                ..CircuitBreakerConfig::default()
            })
            .err(),
            Some(BreakerConfigError::ZeroHalfOpenRequests)
        );
        assert_eq!(
            CircuitBreaker::with_config(CircuitBreakerConfig {
                reset_timeout: Duration::ZERO,
                ..CircuitBreakerConfig::default()
            })
            .err(),
            Some(BreakerConfigError::ZeroResetTimeout)
        );
    }

    #[test]
    fn test_concurrent_failures_open_once() {
        let breaker = Arc::new(CircuitBreaker::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let breaker = Arc::clone(&breaker);
            handles.push(thread::spawn(move || {
                breaker.record_failure();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = breaker.snapshot();
        assert_eq!(snapshot.state, CircuitState::Open);
        assert_eq!(snapshot.total_failures, 10);
        assert_eq!(snapshot.consecutive_failures, 10);
    }

    #[test]
    fn test_concurrent_probe_budget_is_bounded() {
        let (breaker, clock) = breaker_with_mock(quick_config());
        let breaker = Arc::new(breaker);

        for _ in 0..3 {
            breaker.record_failure();
        }
        clock.advance(Duration::from_millis(1000));

        let mut handles = vec![];
        for _ in 0..20 {
            let breaker = Arc::clone(&breaker);
            handles.push(thread::spawn(move || breaker.can_execute()));
        }

        let admitted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|&was_admitted| was_admitted)
            .count();

        // Exactly the probe budget gets through, no matter how many race
        assert_eq!(admitted, 3);
    }
}
