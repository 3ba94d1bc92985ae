//! # resilience-toolkit
//!
//! In-process resilience primitives for keeping a request-serving tier
//! stable under partial failure and load: a circuit breaker, a bounded
//! TTL/tag cache, a fixed-window rate limiter, a health-check aggregator,
//! a threshold alert evaluator, a capacity planner, exponential backoff
//! with jitter, and a tiered degradation controller.
//!
//! The primitives do not depend on each other; a caller (an API gateway
//! layer, a resolver, a scheduled job) composes them: wrap a downstream
//! call with the circuit breaker, gate it with the rate limiter, cache its
//! result, feed its latency into the alert evaluator, and consult the
//! degradation controller to decide whether to call it at all.
//!
//! ## Quick Start
//!
//! ```rust
//! use resilience_toolkit::{CircuitBreaker, FixedWindowLimiter, TaggedCache};
//! use std::time::Duration;
//!
//! let breaker = CircuitBreaker::new();
//! let limiter = FixedWindowLimiter::new();
//! let cache: TaggedCache<String> = TaggedCache::new();
//!
//! // Admission first, then the cache, then the gated downstream call.
//! if limiter.check("user:42").allowed {
//!     if let Some(profile) = cache.get("profile:42") {
//!         // serve from cache
//!     } else if breaker.can_execute() {
//!         // ... call the downstream service ...
//!         let fetched = "profile data".to_string();
//!         breaker.record_success(); // or record_failure() on error
//!         cache.set_with("profile:42", fetched, Some(Duration::from_secs(30)), &["profiles"]);
//!     }
//! }
//! ```
//!
//! ## No background timers
//!
//! Nothing in this crate spawns a thread, polls, or schedules work. Every
//! time-driven transition - a circuit moving from open to half-open, a rate
//! window rolling over, a cache entry expiring - is evaluated lazily at the
//! moment a caller asks, against a [`Clock`] read at call time. That keeps
//! every operation synchronous and bounded, and makes the whole toolkit
//! deterministic under test: inject a `MockClock`, advance it, call an
//! operation, observe the transition.
//!
//! ```rust
//! use resilience_toolkit::infrastructure::mocks::MockClock;
//! use resilience_toolkit::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//!
//! let clock = Arc::new(MockClock::new(Instant::now()));
//! let breaker = CircuitBreaker::with_config_and_clock(
//!     CircuitBreakerConfig {
//!         failure_threshold: 3,
//!         reset_timeout: Duration::from_secs(1),
//!         half_open_requests: 3,
//!     },
//!     clock.clone(),
//! )
//! .unwrap();
//!
//! for _ in 0..3 {
//!     breaker.record_failure();
//! }
//! assert_eq!(breaker.state(), CircuitState::Open);
//!
//! clock.advance(Duration::from_secs(1));
//! assert_eq!(breaker.state(), CircuitState::HalfOpen);
//! ```
//!
//! ## Errors are return values
//!
//! Expected runtime conditions - a cache miss, a rate limit exceeded, an
//! open circuit, exhausted retries - are ordinary return values, so the hot
//! path branches without error-handling overhead. `Result` appears in
//! exactly one place: constructors reject invalid configuration (a zero
//! entry bound, a zero window) with a descriptive error instead of
//! silently clamping.
//!
//! ## Concurrency
//!
//! Every primitive is safe to share across request workers. Compound
//! read-modify-write sequences (`can_execute` with its probe accounting,
//! `get`/`set` with eviction, `check`'s read-then-increment) each run as
//! one critical section behind a mutex or a per-key map guard.
//!
//! ## Known characteristic: fixed-window bursts
//!
//! The rate limiter uses fixed windows, not sliding ones. A burst at the
//! boundary of two windows can momentarily admit close to twice the
//! configured rate. This is preserved deliberately; see
//! [`FixedWindowLimiter`].
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` on configuration and report types
//!   (alert rules, degradation levels, health reports, cache statistics).
//! - `test-helpers`: exposes `infrastructure::mocks::MockClock` so
//!   downstream test suites can drive time explicitly.

// Domain layer - pure decision logic
pub mod domain;

// Application layer - stateful primitives behind the Clock port
pub mod application;

// Infrastructure layer - adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    alert::{
        check_alerts, evaluate_alert_rule, AlertCondition, AlertEvaluation, AlertRule,
        AlertSeverity,
    },
    backoff::{calculate_backoff, should_retry, BackoffConfig, BackoffConfigError},
    capacity::{plan_capacity, CapacityInputError, CapacityPlan, TrafficProfile},
    degradation::{
        degradation_config, is_feature_enabled, DegradationConfig, DegradationLevel, ALL_FEATURES,
    },
    indexing::{index_recommendations, recommendations_for, IndexRecommendation},
};

pub use application::{
    breaker::{
        BreakerConfigError, CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, CircuitState,
    },
    cache::{CacheConfig, CacheConfigError, CacheStats, TaggedCache},
    health::{
        CheckReport, HealthChecker, HealthProbe, HealthReport, HealthStatus, ProbeResult,
        ProbeStatus,
    },
    ports::Clock,
    rate_limit::{
        FixedWindowLimiter, RateLimitDecision, RateLimiterConfig, RateLimiterConfigError,
    },
};

pub use infrastructure::clock::SystemClock;
