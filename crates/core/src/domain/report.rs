use serde::{Deserialize, Serialize};

use crate::domain::plan::PlanTier;

/// Canonical form for report-name comparison: trimmed, lowercased, internal
/// whitespace runs collapsed to single spaces.
pub fn normalize_report(raw: &str) -> String {
    raw.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Included,
    Optional,
    Paid,
    NotFound,
}

/// Outcome of a single entitlement query. Produced fresh per query; callers
/// may snapshot it into session state but the resolver never retains it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub status: CoverageStatus,
    pub current_plan: PlanTier,
    pub lowest_plan: Option<PlanTier>,
    pub paid_only: bool,
    pub canonical_report: String,
}
