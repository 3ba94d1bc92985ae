//! Full circuit breaker lifecycle driven through the public API with a
//! mock clock: closed -> open -> half-open -> closed.

use resilience_toolkit::infrastructure::mocks::MockClock;
use resilience_toolkit::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn breaker(clock: Arc<MockClock>) -> CircuitBreaker {
    CircuitBreaker::with_config_and_clock(
        CircuitBreakerConfig {
            failure_threshold: 3,
            reset_timeout: Duration::from_millis(1000),
            half_open_requests: 3,
        },
        clock,
    )
    .unwrap()
}

#[test]
fn test_full_recovery_lifecycle() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let breaker = breaker(clock.clone());

    // Three consecutive failures trip the circuit
    for _ in 0..3 {
        breaker.record_failure();
    }
    assert_eq!(breaker.snapshot().state, CircuitState::Open);
    assert!(!breaker.can_execute());

    // After the reset timeout, probes are admitted
    clock.advance(Duration::from_millis(1000));
    assert!(breaker.can_execute());
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    // Three probe successes close the circuit with a clean slate
    breaker.record_success();
    breaker.record_success();
    breaker.record_success();

    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
}

#[test]
fn test_failed_recovery_starts_cooldown_again() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let breaker = breaker(clock.clone());

    for _ in 0..3 {
        breaker.record_failure();
    }
    clock.advance(Duration::from_millis(1000));
    assert!(breaker.can_execute());

    // The probe fails; the circuit reopens and the timeout restarts
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);

    clock.advance(Duration::from_millis(999));
    assert!(!breaker.can_execute());
    clock.advance(Duration::from_millis(1));
    assert!(breaker.can_execute());
}

#[test]
fn test_open_circuit_stays_open_without_time_passing() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let breaker = breaker(clock);

    for _ in 0..3 {
        breaker.record_failure();
    }

    // However many times callers ask, the answer does not change until
    // the clock moves
    for _ in 0..100 {
        assert!(!breaker.can_execute());
    }
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[test]
fn test_breakers_are_independent_per_dependency() {
    let clock = Arc::new(MockClock::new(Instant::now()));
    let payments = breaker(clock.clone());
    let email = breaker(clock);

    for _ in 0..3 {
        payments.record_failure();
    }

    assert_eq!(payments.state(), CircuitState::Open);
    assert_eq!(email.state(), CircuitState::Closed);
    assert!(email.can_execute());
}
