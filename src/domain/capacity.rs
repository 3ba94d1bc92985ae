//! Capacity estimation from traffic parameters.
//!
//! Translates traffic assumptions into an instance-count recommendation
//! using a deliberately simple single-instance throughput model. The outputs
//! are estimates, not guarantees.

/// Traffic assumptions the plan is derived from.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrafficProfile {
    /// Users active in a typical minute
    pub current_users: u64,
    /// Concurrency ceiling of the current deployment
    pub max_concurrent: u64,
    /// Requests one user issues per minute
    pub avg_requests_per_user: f64,
    /// Mean downstream response time in milliseconds
    pub avg_response_time_ms: f64,
    /// Multiplier applied to average traffic to model peaks
    pub peak_multiplier: f64,
}

/// Error returned when a traffic profile cannot be planned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityInputError {
    /// avg_requests_per_user must be a positive finite number
    NonPositiveRequestRate,
    /// avg_response_time_ms must be a positive finite number
    NonPositiveResponseTime,
    /// peak_multiplier must be a positive finite number
    NonPositivePeakMultiplier,
}

impl std::fmt::Display for CapacityInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityInputError::NonPositiveRequestRate => {
                write!(f, "avg_requests_per_user must be positive")
            }
            CapacityInputError::NonPositiveResponseTime => {
                write!(f, "avg_response_time_ms must be positive")
            }
            CapacityInputError::NonPositivePeakMultiplier => {
                write!(f, "peak_multiplier must be positive")
            }
        }
    }
}

impl std::error::Error for CapacityInputError {}

impl TrafficProfile {
    /// Validate the profile before planning.
    pub fn validate(&self) -> Result<(), CapacityInputError> {
        if !(self.avg_requests_per_user.is_finite() && self.avg_requests_per_user > 0.0) {
            return Err(CapacityInputError::NonPositiveRequestRate);
        }
        if !(self.avg_response_time_ms.is_finite() && self.avg_response_time_ms > 0.0) {
            return Err(CapacityInputError::NonPositiveResponseTime);
        }
        if !(self.peak_multiplier.is_finite() && self.peak_multiplier > 0.0) {
            return Err(CapacityInputError::NonPositivePeakMultiplier);
        }
        Ok(())
    }
}

/// Instance-count recommendation derived from a [`TrafficProfile`].
///
/// All fields are whole numbers; percentages are rounded, instance counts
/// ceiled, user estimates floored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapacityPlan {
    /// Average request rate, requests per second
    pub requests_per_second: u64,
    /// Peak request rate, requests per second
    pub peak_requests_per_second: u64,
    /// Requests per second one instance can sustain
    pub instance_capacity: u64,
    /// Average load as a percentage of one instance
    pub current_load_pct: u64,
    /// Peak load as a percentage of one instance
    pub peak_load_pct: u64,
    /// Remaining single-instance headroom at peak, floored at zero
    pub headroom_pct: u64,
    /// Instances needed to stay at 70% utilization at peak
    pub recommended_instances: u64,
    /// Users one instance can serve at 70% utilization
    pub estimated_max_users: u64,
}

/// Derive a capacity plan from traffic assumptions.
///
/// The model assumes one instance sustains `1000 / avg_response_time_ms`
/// requests per second and targets 70% utilization at peak.
pub fn plan_capacity(profile: &TrafficProfile) -> Result<CapacityPlan, CapacityInputError> {
    profile.validate()?;

    let rps = profile.current_users as f64 * profile.avg_requests_per_user / 60.0;
    let peak_rps = rps * profile.peak_multiplier;
    let instance_capacity = 1000.0 / profile.avg_response_time_ms;

    let current_load_pct = (rps / instance_capacity * 100.0).round();
    let peak_load_pct = (peak_rps / instance_capacity * 100.0).round();
    let headroom_pct = (100.0 - peak_load_pct).max(0.0);

    let recommended_instances = (peak_rps / (instance_capacity * 0.7)).ceil().max(1.0);
    let estimated_max_users =
        (instance_capacity * 60.0 * 0.7 / profile.avg_requests_per_user).floor();

    Ok(CapacityPlan {
        requests_per_second: rps.round() as u64,
        peak_requests_per_second: peak_rps.round() as u64,
        instance_capacity: instance_capacity.round() as u64,
        current_load_pct: current_load_pct as u64,
        peak_load_pct: peak_load_pct as u64,
        headroom_pct: headroom_pct as u64,
        recommended_instances: recommended_instances as u64,
        estimated_max_users: estimated_max_users as u64,
    })
}
