use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Subscription tier. The derived order is the coverage order: a plan covers
/// every report whose lowest tier sorts at or below it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlanTier {
    Bronze,
    Silver,
    Gold,
}

impl PlanTier {
    /// Tiers from lowest to highest; index build order depends on this.
    pub const ASCENDING: [PlanTier; 3] = [PlanTier::Bronze, PlanTier::Silver, PlanTier::Gold];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
        }
    }

    pub fn covers(&self, lowest: PlanTier) -> bool {
        *self >= lowest
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanTier {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BRONZE" => Ok(Self::Bronze),
            "SILVER" => Ok(Self::Silver),
            "GOLD" => Ok(Self::Gold),
            other => Err(DomainError::InvalidPlanTier(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PlanTier;

    #[test]
    fn tiers_are_strictly_ordered() {
        assert!(PlanTier::Bronze < PlanTier::Silver);
        assert!(PlanTier::Silver < PlanTier::Gold);
        assert!(PlanTier::Gold.covers(PlanTier::Bronze));
        assert!(!PlanTier::Bronze.covers(PlanTier::Silver));
        assert!(PlanTier::Silver.covers(PlanTier::Silver));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(" gold ".parse::<PlanTier>().expect("gold"), PlanTier::Gold);
        assert_eq!("Silver".parse::<PlanTier>().expect("silver"), PlanTier::Silver);
        assert!("PLATINUM".parse::<PlanTier>().is_err());
    }

    #[test]
    fn serializes_to_uppercase_wire_names() {
        assert_eq!(serde_json::to_string(&PlanTier::Bronze).expect("json"), "\"BRONZE\"");
        let parsed: PlanTier = serde_json::from_str("\"GOLD\"").expect("parse");
        assert_eq!(parsed, PlanTier::Gold);
    }
}
