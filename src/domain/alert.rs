//! Threshold alert rules evaluated against metric snapshots.
//!
//! The evaluator is stateless: callers supply a snapshot of numeric readings
//! and a set of immutable rules, and get back which rules triggered. Rules
//! whose metric is absent from the snapshot are silently skipped; the
//! evaluator has no opinion on missing telemetry.

use std::collections::BTreeMap;

/// Severity attached to an alert rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlertSeverity {
    /// Informational; no action expected
    Info,
    /// Needs attention soon
    Warning,
    /// Needs immediate attention
    Critical,
}

/// Comparison applied between a metric reading and a rule threshold.
///
/// Resolved once at rule-definition time; an unrepresentable condition is
/// rejected when the rule is built (or deserialized), never at evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AlertCondition {
    /// Value strictly greater than the threshold
    Gt,
    /// Value strictly less than the threshold
    Lt,
    /// Value equal to the threshold (within `f64::EPSILON`)
    Eq,
    /// Value greater than or equal to the threshold
    Gte,
    /// Value less than or equal to the threshold
    Lte,
}

impl AlertCondition {
    /// Apply the comparison to a reading.
    pub fn compare(self, value: f64, threshold: f64) -> bool {
        match self {
            AlertCondition::Gt => value > threshold,
            AlertCondition::Lt => value < threshold,
            AlertCondition::Eq => (value - threshold).abs() < f64::EPSILON,
            AlertCondition::Gte => value >= threshold,
            AlertCondition::Lte => value <= threshold,
        }
    }
}

/// A threshold rule over one named metric. Immutable after definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertRule {
    /// Stable identifier for deduplication and routing
    pub id: String,
    /// Human-readable rule name
    pub name: String,
    /// Key into the metric snapshot
    pub metric: String,
    /// Comparison to apply
    pub condition: AlertCondition,
    /// Threshold the reading is compared against
    pub threshold: f64,
    /// Severity reported when the rule triggers
    pub severity: AlertSeverity,
}

/// Outcome of evaluating one rule against one reading.
#[derive(Debug, Clone, Copy)]
pub struct AlertEvaluation<'a> {
    /// The rule that was evaluated
    pub rule: &'a AlertRule,
    /// The reading the rule was evaluated against
    pub value: f64,
    /// Whether the rule's condition held
    pub triggered: bool,
}

/// Evaluate a single rule against a reading.
pub fn evaluate_alert_rule(rule: &AlertRule, value: f64) -> bool {
    rule.condition.compare(value, rule.threshold)
}

/// Evaluate every rule whose metric is present in the snapshot.
///
/// Rules for metrics not present are skipped without error. The returned
/// evaluations preserve rule order and include non-triggered results so
/// callers can report both sides.
pub fn check_alerts<'a>(
    metrics: &BTreeMap<String, f64>,
    rules: &'a [AlertRule],
) -> Vec<AlertEvaluation<'a>> {
    rules
        .iter()
        .filter_map(|rule| {
            metrics.get(&rule.metric).map(|&value| AlertEvaluation {
                rule,
                value,
                triggered: evaluate_alert_rule(rule, value),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(metric: &str, condition: AlertCondition, threshold: f64) -> AlertRule {
        AlertRule {
            id: format!("{}-{:?}", metric, condition),
            name: format!("{} threshold", metric),
            metric: metric.to_string(),
            condition,
            threshold,
            severity: AlertSeverity::Warning,
        }
    }

    #[test]
    fn test_conditions() {
        assert!(AlertCondition::Gt.compare(5.0, 4.0));
        assert!(!AlertCondition::Gt.compare(4.0, 4.0));

        assert!(AlertCondition::Lt.compare(3.0, 4.0));
        assert!(!AlertCondition::Lt.compare(4.0, 4.0));

        assert!(AlertCondition::Eq.compare(4.0, 4.0));
        assert!(!AlertCondition::Eq.compare(4.0001, 4.0));

        assert!(AlertCondition::Gte.compare(4.0, 4.0));
        assert!(AlertCondition::Gte.compare(5.0, 4.0));
        assert!(!AlertCondition::Gte.compare(3.0, 4.0));

        assert!(AlertCondition::Lte.compare(4.0, 4.0));
        assert!(AlertCondition::Lte.compare(3.0, 4.0));
        assert!(!AlertCondition::Lte.compare(5.0, 4.0));
    }

    #[test]
    fn test_evaluate_single_rule() {
        let r = rule("error_rate", AlertCondition::Gt, 0.05);

        assert!(evaluate_alert_rule(&r, 0.1));
        assert!(!evaluate_alert_rule(&r, 0.01));
    }

    #[test]
    fn test_check_alerts_skips_missing_metrics() {
        let rules = vec![
            rule("error_rate", AlertCondition::Gt, 0.05),
            rule("p99_latency_ms", AlertCondition::Gte, 500.0),
            rule("queue_depth", AlertCondition::Gt, 1000.0),
        ];

        let mut metrics = BTreeMap::new();
        metrics.insert("error_rate".to_string(), 0.2);
        metrics.insert("p99_latency_ms".to_string(), 120.0);
        // queue_depth deliberately absent

        let evaluations = check_alerts(&metrics, &rules);
        assert_eq!(evaluations.len(), 2);

        assert_eq!(evaluations[0].rule.metric, "error_rate");
        assert!(evaluations[0].triggered);
        assert_eq!(evaluations[0].value, 0.2);

        assert_eq!(evaluations[1].rule.metric, "p99_latency_ms");
        assert!(!evaluations[1].triggered);
    }

    #[test]
    fn test_check_alerts_empty_inputs() {
        let metrics = BTreeMap::new();
        let rules = vec![rule("cpu", AlertCondition::Gt, 90.0)];

        assert!(check_alerts(&metrics, &rules).is_empty());
        assert!(check_alerts(&metrics, &[]).is_empty());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(AlertSeverity::Critical > AlertSeverity::Warning);
        assert!(AlertSeverity::Warning > AlertSeverity::Info);
    }
}
