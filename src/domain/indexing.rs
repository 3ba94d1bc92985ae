//! Static index recommendations.
//!
//! Advisory data only: a curated list of database indexes worth creating for
//! the query patterns this tier serves. Nothing here talks to a database.

/// One suggested index.
#[derive(Debug, Clone, Copy)]
pub struct IndexRecommendation {
    /// Table the index belongs on
    pub table: &'static str,
    /// Columns, in index order
    pub columns: &'static [&'static str],
    /// Query pattern the index serves
    pub reason: &'static str,
}

static RECOMMENDATIONS: &[IndexRecommendation] = &[
    IndexRecommendation {
        table: "listings",
        columns: &["status", "created_at"],
        reason: "browse pages filter by status and sort newest-first",
    },
    IndexRecommendation {
        table: "applications",
        columns: &["listing_id", "status"],
        reason: "per-listing application lookups on every detail page",
    },
    IndexRecommendation {
        table: "applications",
        columns: &["applicant_id", "created_at"],
        reason: "applicant dashboards list their own applications",
    },
    IndexRecommendation {
        table: "donations",
        columns: &["created_at"],
        reason: "reporting scans recent donations by date range",
    },
    IndexRecommendation {
        table: "notifications",
        columns: &["user_id", "read"],
        reason: "unread-count badge queries on every page load",
    },
    IndexRecommendation {
        table: "sessions",
        columns: &["expires_at"],
        reason: "expired-session sweeps scan by expiry",
    },
];

/// The full advisory catalog.
pub fn index_recommendations() -> &'static [IndexRecommendation] {
    RECOMMENDATIONS
}

/// Recommendations for a single table.
pub fn recommendations_for(table: &str) -> Vec<&'static IndexRecommendation> {
    RECOMMENDATIONS.iter().filter(|r| r.table == table).collect()
}
