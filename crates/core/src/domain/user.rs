use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::plan::PlanTier;

/// A registry-owned user record. The registry hands out clones only; plan
/// changes go through `UserRegistry::set_plan`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub company_name: String,
    pub user_name: String,
    pub data_plan: PlanTier,
    pub email: String,
    pub uid: String,
    pub last_modified: DateTime<Utc>,
}
