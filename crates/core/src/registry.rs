use std::collections::HashMap;

use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::domain::plan::PlanTier;
use crate::domain::user::UserProfile;

/// Mock user directory. Profiles are owned here exclusively; lookups return
/// clones so no caller can mutate a record outside `set_plan`. The two
/// indexes (normalized user name, uid) always reference the same record
/// because the name index stores uids rather than duplicate profiles.
#[derive(Debug, Default)]
pub struct UserRegistry {
    by_uid: HashMap<String, UserProfile>,
    uid_by_name: HashMap<String, String>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the demo bank users.
    pub fn with_demo_users() -> Self {
        let mut registry = Self::new();
        let seeded_at = start_of_current_month();
        for (company_name, user_name, data_plan) in DEMO_USERS {
            registry.insert(UserProfile {
                company_name: company_name.to_string(),
                user_name: user_name.to_string(),
                data_plan: *data_plan,
                email: format!("{user_name}@{}.com", company_domain(company_name)),
                uid: format!("U{}", 1001 + registry.len()),
                last_modified: seeded_at,
            });
        }
        registry
    }

    pub fn insert(&mut self, profile: UserProfile) {
        self.uid_by_name.insert(profile.user_name.to_lowercase(), profile.uid.clone());
        self.by_uid.insert(profile.uid.clone(), profile);
    }

    /// Case-insensitive username lookup. Returns a snapshot clone.
    pub fn find_by_username(&self, user_name: &str) -> Option<UserProfile> {
        let uid = self.uid_by_name.get(&user_name.to_lowercase())?;
        self.by_uid.get(uid).cloned()
    }

    pub fn find_by_uid(&self, uid: &str) -> Option<UserProfile> {
        self.by_uid.get(uid).cloned()
    }

    /// Update a user's plan by uid. Accepts GOLD/SILVER/BRONZE in any case.
    /// Returns false without mutating on an invalid plan string or unknown
    /// uid. Setting the already-active plan succeeds as a no-op and leaves
    /// `last_modified` untouched.
    pub fn set_plan(&mut self, uid: &str, plan: &str) -> bool {
        let Ok(requested) = plan.parse::<PlanTier>() else {
            return false;
        };
        let Some(profile) = self.by_uid.get_mut(uid) else {
            return false;
        };

        if profile.data_plan == requested {
            return true;
        }

        profile.data_plan = requested;
        profile.last_modified = Utc::now();
        true
    }

    /// Snapshot of all profiles, for diagnostics.
    pub fn list(&self) -> Vec<UserProfile> {
        let mut profiles: Vec<UserProfile> = self.by_uid.values().cloned().collect();
        profiles.sort_by(|a, b| a.uid.cmp(&b.uid));
        profiles
    }

    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }
}

const DEMO_USERS: &[(&str, &str, PlanTier)] = &[
    ("Fargo Bank", "alice", PlanTier::Gold),
    ("Fargo Bank", "bob", PlanTier::Silver),
    ("Fargo Bank", "charlie", PlanTier::Bronze),
    ("LUMN-5577", "USR-AstroZen", PlanTier::Gold),
    ("QUAS-3344", "USR-NebulaX", PlanTier::Gold),
    ("CMPX-9012", "USR-ApolloX", PlanTier::Gold),
    ("VRTX-6633", "USR-StellarQ", PlanTier::Gold),
    ("STRM-8822", "USR-Galactiq", PlanTier::Gold),
    ("NOVA-7788", "USR-OrionEdge", PlanTier::Bronze),
    ("PLSM-2201", "USR-Solarix", PlanTier::Bronze),
    ("CRYX-9900", "USR-Meteorix", PlanTier::Bronze),
    ("ZEN-4521", "USR-LunaSky", PlanTier::Silver),
    ("AURA-1199", "USR-Cosmosia", PlanTier::Silver),
];

fn company_domain(company_name: &str) -> String {
    company_name.split_whitespace().collect::<String>().to_lowercase()
}

fn start_of_current_month() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0).single().unwrap_or(now)
}
