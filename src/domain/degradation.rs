//! Tiered service degradation.
//!
//! Five ordered levels, each with a fixed set of disabled features and a
//! user-facing message. The mapping is static configuration: escalation
//! policy lives with the operators, not in code that computes it at runtime.

/// Sentinel feature name that disables every feature, including ones not
/// explicitly listed.
pub const ALL_FEATURES: &str = "all";

/// Degradation levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DegradationLevel {
    /// Full functionality
    Normal,
    /// Expensive personalization switched off
    Reduced,
    /// Core flows only
    Minimal,
    /// Browsing allowed, all writes rejected
    ReadOnly,
    /// Everything off
    Maintenance,
}

impl DegradationLevel {
    /// All levels in severity order.
    pub const ALL: [DegradationLevel; 5] = [
        DegradationLevel::Normal,
        DegradationLevel::Reduced,
        DegradationLevel::Minimal,
        DegradationLevel::ReadOnly,
        DegradationLevel::Maintenance,
    ];
}

impl std::fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradationLevel::Normal => write!(f, "normal"),
            DegradationLevel::Reduced => write!(f, "reduced"),
            DegradationLevel::Minimal => write!(f, "minimal"),
            DegradationLevel::ReadOnly => write!(f, "read-only"),
            DegradationLevel::Maintenance => write!(f, "maintenance"),
        }
    }
}

/// What one level disables, and the message shown to users at that level.
#[derive(Debug, Clone, Copy)]
pub struct DegradationConfig {
    /// Features switched off at this level. Supersets of every less severe
    /// level; `"all"` disables everything.
    pub disabled_features: &'static [&'static str],
    /// User-facing explanation for the current level
    pub message: &'static str,
}

static NORMAL: DegradationConfig = DegradationConfig {
    disabled_features: &[],
    message: "All features are available.",
};

static REDUCED: DegradationConfig = DegradationConfig {
    disabled_features: &["recommendations", "similar-listings", "analytics-dashboard"],
    message: "Some personalized features are temporarily unavailable.",
};

static MINIMAL: DegradationConfig = DegradationConfig {
    disabled_features: &[
        "recommendations",
        "similar-listings",
        "analytics-dashboard",
        "image-uploads",
        "exports",
        "notifications",
    ],
    message: "We are running with core features only while we recover.",
};

static READ_ONLY: DegradationConfig = DegradationConfig {
    disabled_features: &[
        "recommendations",
        "similar-listings",
        "analytics-dashboard",
        "image-uploads",
        "exports",
        "notifications",
        "submissions",
        "payments",
        "account-updates",
    ],
    message: "Browsing is available, but changes cannot be saved right now.",
};

static MAINTENANCE: DegradationConfig = DegradationConfig {
    disabled_features: &[ALL_FEATURES],
    message: "The service is down for maintenance. Please check back shortly.",
};

/// Look up the static configuration for a level.
pub fn degradation_config(level: DegradationLevel) -> &'static DegradationConfig {
    match level {
        DegradationLevel::Normal => &NORMAL,
        DegradationLevel::Reduced => &REDUCED,
        DegradationLevel::Minimal => &MINIMAL,
        DegradationLevel::ReadOnly => &READ_ONLY,
        DegradationLevel::Maintenance => &MAINTENANCE,
    }
}

/// Whether a feature is enabled at the given level.
///
/// The `"all"` sentinel disables every feature, including ones not
/// explicitly named in any list.
pub fn is_feature_enabled(feature: &str, level: DegradationLevel) -> bool {
    let disabled = degradation_config(level).disabled_features;
    if disabled.contains(&ALL_FEATURES) {
        return false;
    }
    !disabled.contains(&feature)
}
