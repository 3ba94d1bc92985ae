//! Health probe registry and aggregation.
//!
//! Collaborators register named probe closures; `report()` evaluates them
//! all on demand and folds the results into one process-level status. A
//! probe that panics is isolated and reported as a failing check - one
//! misbehaving probe must never take down the aggregation.
//!
//! Results are ephemeral: nothing is stored between calls.

use crate::application::ports::Clock;
use crate::infrastructure::clock::SystemClock;
use std::panic;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

/// Outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProbeStatus {
    /// The dependency is fully functional
    Pass,
    /// Functional but impaired
    Warn,
    /// Not functional
    Fail,
}

/// Aggregated process health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HealthStatus {
    /// Every check passed
    Healthy,
    /// At least one check warned, none failed
    Degraded,
    /// At least one check failed
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// What a probe closure returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Probe verdict
    pub status: ProbeStatus,
    /// Probe-measured latency; when absent, the checker fills in the
    /// elapsed evaluation time
    pub latency: Option<Duration>,
    /// Optional detail, typically set on warn/fail
    pub message: Option<String>,
}

impl ProbeResult {
    /// A passing result.
    pub fn pass() -> Self {
        Self {
            status: ProbeStatus::Pass,
            latency: None,
            message: None,
        }
    }

    /// A warning result with a detail message.
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Warn,
            latency: None,
            message: Some(message.into()),
        }
    }

    /// A failing result with a detail message.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Fail,
            latency: None,
            message: Some(message.into()),
        }
    }

    /// Attach a probe-measured latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

/// A registered probe. Evaluated synchronously on every `report()` call.
pub type HealthProbe = Box<dyn Fn() -> ProbeResult + Send + Sync>;

/// One evaluated check inside a [`HealthReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckReport {
    /// Name the probe was registered under
    pub name: String,
    /// Probe verdict (Fail when the probe panicked)
    pub status: ProbeStatus,
    /// Probe-supplied or measured latency
    pub latency: Option<Duration>,
    /// Optional detail
    pub message: Option<String>,
}

/// Aggregated health at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealthReport {
    /// Worst status across all checks
    pub status: HealthStatus,
    /// Time since the checker was created
    pub uptime: Duration,
    /// Every check, in registration order
    pub checks: Vec<CheckReport>,
    /// Wall-clock time the report was produced
    pub checked_at: SystemTime,
}

/// Registry of named probes aggregated into one status.
///
/// # Example
/// ```
/// use resilience_toolkit::{HealthChecker, HealthStatus, ProbeResult};
///
/// let checker = HealthChecker::new();
/// checker.add_check("database", || ProbeResult::pass());
/// checker.add_check("mail", || ProbeResult::warn("queue backed up"));
///
/// let report = checker.report();
/// assert_eq!(report.status, HealthStatus::Degraded);
/// assert_eq!(report.checks.len(), 2);
/// ```
pub struct HealthChecker {
    checks: Mutex<Vec<(String, HealthProbe)>>,
    started_at: std::time::Instant,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.checks.lock().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("HealthChecker")
            .field("checks", &count)
            .finish()
    }
}

impl HealthChecker {
    /// Create a checker using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Create a checker with a custom clock (mainly for testing).
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            checks: Mutex::new(Vec::new()),
            started_at: clock.now(),
            clock,
        }
    }

    /// Register a probe under a name.
    ///
    /// Registering the same name again replaces the probe in place,
    /// keeping its position in the report order.
    pub fn add_check(
        &self,
        name: impl Into<String>,
        probe: impl Fn() -> ProbeResult + Send + Sync + 'static,
    ) {
        let name = name.into();
        let mut checks = self.checks.lock().expect("health checker mutex poisoned");
        if let Some(existing) = checks.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = Box::new(probe);
        } else {
            checks.push((name, Box::new(probe)));
        }
    }

    /// Unregister a probe. Returns whether it existed.
    pub fn remove_check(&self, name: &str) -> bool {
        let mut checks = self.checks.lock().expect("health checker mutex poisoned");
        let before = checks.len();
        checks.retain(|(n, _)| n != name);
        checks.len() < before
    }

    /// Number of registered probes.
    pub fn check_count(&self) -> usize {
        self.checks.lock().expect("health checker mutex poisoned").len()
    }

    /// Evaluate every probe and aggregate.
    ///
    /// Probes run synchronously in registration order while the registry
    /// lock is held; probes must not register or remove checks.
    pub fn report(&self) -> HealthReport {
        let checks = self.checks.lock().expect("health checker mutex poisoned");
        let mut reports = Vec::with_capacity(checks.len());

        for (name, probe) in checks.iter() {
            let began = self.clock.now();
            let outcome = panic::catch_unwind(panic::AssertUnwindSafe(probe));
            let elapsed = self.clock.now().saturating_duration_since(began);

            let report = match outcome {
                Ok(result) => CheckReport {
                    name: name.clone(),
                    status: result.status,
                    latency: result.latency.or(Some(elapsed)),
                    message: result.message,
                },
                Err(_) => CheckReport {
                    name: name.clone(),
                    status: ProbeStatus::Fail,
                    latency: Some(elapsed),
                    message: Some("health check panicked".to_string()),
                },
            };
            reports.push(report);
        }
        drop(checks);

        let status = aggregate_status(&reports);
        if status == HealthStatus::Unhealthy {
            let failing: Vec<&str> = reports
                .iter()
                .filter(|c| c.status == ProbeStatus::Fail)
                .map(|c| c.name.as_str())
                .collect();
            tracing::warn!(?failing, "health check reported unhealthy");
        }

        HealthReport {
            status,
            uptime: self.clock.now().saturating_duration_since(self.started_at),
            checks: reports,
            checked_at: SystemTime::now(),
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn aggregate_status(checks: &[CheckReport]) -> HealthStatus {
    if checks.iter().any(|c| c.status == ProbeStatus::Fail) {
        HealthStatus::Unhealthy
    } else if checks.iter().any(|c| c.status == ProbeStatus::Warn) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
