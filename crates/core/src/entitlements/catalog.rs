use serde::{Deserialize, Serialize};

use crate::domain::plan::PlanTier;

/// Report sets offered under one tier. `included` reports come with the
/// subscription; `optional` reports can be enabled under that tier but are
/// not automatic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEntitlements {
    pub included: Vec<String>,
    pub optional: Vec<String>,
}

/// Add-on reports purchasable regardless of tier. Membership here overrides
/// any tier classification at query time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidReports {
    pub reports: Vec<String>,
}

/// Static plan -> report-set mapping. Read-only at query time; the resolver
/// snapshots it into an index at startup and sessions carry a serialized copy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitlementCatalog {
    #[serde(rename = "BRONZE")]
    pub bronze: TierEntitlements,
    #[serde(rename = "SILVER")]
    pub silver: TierEntitlements,
    #[serde(rename = "GOLD")]
    pub gold: TierEntitlements,
    #[serde(rename = "PAID")]
    pub paid: PaidReports,
}

impl EntitlementCatalog {
    pub fn tier(&self, tier: PlanTier) -> &TierEntitlements {
        match tier {
            PlanTier::Bronze => &self.bronze,
            PlanTier::Silver => &self.silver,
            PlanTier::Gold => &self.gold,
        }
    }

    /// The demo catalog used by the assistant. Note the deliberate overlaps:
    /// `Spending Summary` is optional under BRONZE and included under SILVER,
    /// and `Fraud Risk Assessment` appears both under GOLD optional and in
    /// the paid-only list.
    pub fn standard() -> Self {
        Self {
            bronze: TierEntitlements {
                included: names(&["Account Statement", "Transaction History"]),
                optional: names(&["Spending Summary", "Credit Report"]),
            },
            silver: TierEntitlements {
                included: names(&[
                    "Account Statement",
                    "Transaction History",
                    "Spending Summary",
                    "Credit Report",
                ]),
                optional: names(&["Wire Transfer Report", "Merchant Analytics"]),
            },
            gold: TierEntitlements {
                included: names(&[
                    "Account Statement",
                    "Transaction History",
                    "Spending Summary",
                    "Credit Report",
                    "Wire Transfer Report",
                    "Merchant Analytics",
                    "Portfolio Performance",
                ]),
                optional: names(&["Fraud Risk Assessment"]),
            },
            paid: PaidReports {
                reports: names(&["Regulatory Audit Extract", "Fraud Risk Assessment"]),
            },
        }
    }
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::EntitlementCatalog;
    use crate::domain::plan::PlanTier;

    #[test]
    fn standard_catalog_has_reports_for_every_tier() {
        let catalog = EntitlementCatalog::standard();
        for tier in PlanTier::ASCENDING {
            assert!(!catalog.tier(tier).included.is_empty(), "{tier} should include reports");
        }
        assert!(!catalog.paid.reports.is_empty());
    }

    #[test]
    fn serializes_with_uppercase_tier_keys() {
        let catalog = EntitlementCatalog::standard();
        let value = serde_json::to_value(&catalog).expect("serialize");

        assert!(value["BRONZE"]["included"].is_array());
        assert!(value["SILVER"]["optional"].is_array());
        assert!(value["GOLD"]["included"].is_array());
        assert!(value["PAID"]["reports"].is_array());
    }
}
