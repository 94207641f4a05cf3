use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::plan::PlanTier;

/// Monthly subscription pricing in USD. Serialized into every session so the
/// orchestration layer can quote upgrade costs without reaching back here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTable {
    #[serde(rename = "BRONZE")]
    pub bronze: Decimal,
    #[serde(rename = "SILVER")]
    pub silver: Decimal,
    #[serde(rename = "GOLD")]
    pub gold: Decimal,
}

impl PricingTable {
    pub fn standard() -> Self {
        Self {
            bronze: Decimal::from(100),
            silver: Decimal::from(200),
            gold: Decimal::from(300),
        }
    }

    pub fn monthly(&self, tier: PlanTier) -> Decimal {
        match tier {
            PlanTier::Bronze => self.bronze,
            PlanTier::Silver => self.silver,
            PlanTier::Gold => self.gold,
        }
    }

    pub fn upgrade_delta(&self, from: PlanTier, to: PlanTier) -> Decimal {
        self.monthly(to) - self.monthly(from)
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::PricingTable;
    use crate::domain::plan::PlanTier;

    #[test]
    fn standard_pricing_rises_with_tier() {
        let pricing = PricingTable::standard();
        assert!(pricing.monthly(PlanTier::Bronze) < pricing.monthly(PlanTier::Silver));
        assert!(pricing.monthly(PlanTier::Silver) < pricing.monthly(PlanTier::Gold));
    }

    #[test]
    fn upgrade_delta_is_signed() {
        let pricing = PricingTable::standard();
        assert_eq!(pricing.upgrade_delta(PlanTier::Bronze, PlanTier::Gold), Decimal::from(200));
        assert_eq!(pricing.upgrade_delta(PlanTier::Gold, PlanTier::Silver), Decimal::from(-100));
    }

    #[test]
    fn serializes_with_uppercase_tier_keys() {
        let value = serde_json::to_value(PricingTable::standard()).expect("serialize");
        assert_eq!(value["BRONZE"], 100.0);
        assert_eq!(value["SILVER"], 200.0);
        assert_eq!(value["GOLD"], 300.0);
    }
}
