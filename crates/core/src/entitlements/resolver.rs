use std::collections::{HashMap, HashSet};

use crate::domain::plan::PlanTier;
use crate::domain::report::{normalize_report, CoverageResult, CoverageStatus};
use crate::entitlements::catalog::EntitlementCatalog;

/// Reverse index over the catalog: normalized report name -> lowest tier that
/// offers it, plus the paid-only set. Built once; immutable afterwards, so it
/// can be shared across request handlers without locking.
#[derive(Clone, Debug)]
pub struct EntitlementResolver {
    reverse: HashMap<String, PlanTier>,
    paid: HashSet<String>,
}

impl EntitlementResolver {
    pub fn new(catalog: &EntitlementCatalog) -> Self {
        let mut reverse = HashMap::new();
        // Ascending tier order plus first-write-wins keeps the lowest tier
        // that offers a report, whether included or optional.
        for tier in PlanTier::ASCENDING {
            let entitlements = catalog.tier(tier);
            for name in entitlements.included.iter().chain(entitlements.optional.iter()) {
                reverse.entry(normalize_report(name)).or_insert(tier);
            }
        }

        let paid = catalog.paid.reports.iter().map(|name| normalize_report(name)).collect();

        Self { reverse, paid }
    }

    /// Classify `report` under `plan`. Total over all inputs: unknown names
    /// surface as `not_found`, never as an error.
    pub fn check_entitlement(&self, report: &str, plan: PlanTier) -> CoverageResult {
        let canonical = normalize_report(report);

        // Paid-only wins even when the name also appears in a tier bucket.
        if self.paid.contains(&canonical) {
            return CoverageResult {
                status: CoverageStatus::Paid,
                current_plan: plan,
                lowest_plan: None,
                paid_only: true,
                canonical_report: canonical,
            };
        }

        match self.reverse.get(&canonical).copied() {
            None => CoverageResult {
                status: CoverageStatus::NotFound,
                current_plan: plan,
                lowest_plan: None,
                paid_only: false,
                canonical_report: canonical,
            },
            Some(lowest_plan) => CoverageResult {
                status: if plan.covers(lowest_plan) {
                    CoverageStatus::Included
                } else {
                    CoverageStatus::Optional
                },
                current_plan: plan,
                lowest_plan: Some(lowest_plan),
                paid_only: false,
                canonical_report: canonical,
            },
        }
    }

    /// Canonical names with a tier entry, for catalog matching in the
    /// orchestration layer. Paid-only names are not listed here.
    pub fn canonical_reports(&self) -> impl Iterator<Item = &str> {
        self.reverse.keys().map(String::as_str)
    }

    pub fn paid_reports(&self) -> impl Iterator<Item = &str> {
        self.paid.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }
}
