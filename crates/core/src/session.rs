use std::collections::HashMap;

use chrono::Utc;
use serde_json::{Map, Value};

use crate::domain::user::UserProfile;
use crate::entitlements::catalog::EntitlementCatalog;
use crate::pricing::PricingTable;

/// Per-session conversation state: a JSON object per session id carrying the
/// pricing and entitlement snapshots, the user profile when known, and any
/// fields the orchestration layer writes back (`current_plan`, `report_name`,
/// `entitlement_check`, ...). In-memory only; state dies with the process.
#[derive(Debug)]
pub struct SessionStore {
    catalog: EntitlementCatalog,
    pricing: PricingTable,
    sessions: HashMap<String, Map<String, Value>>,
}

impl SessionStore {
    pub fn new(catalog: EntitlementCatalog, pricing: PricingTable) -> Self {
        Self { catalog, pricing, sessions: HashMap::new() }
    }

    /// Create the session entry if unseen, seeding `created_at` plus pricing
    /// and entitlement snapshots. Re-initializing only attaches/overwrites
    /// `user_profile` when one is supplied; `created_at` and every other
    /// existing field survive.
    pub fn init(&mut self, session_id: &str, user_profile: Option<&UserProfile>) {
        if !self.sessions.contains_key(session_id) {
            let mut state = Map::new();
            state.insert("created_at".to_string(), Value::String(Utc::now().to_rfc3339()));
            state.insert(
                "pricing".to_string(),
                serde_json::to_value(&self.pricing).unwrap_or(Value::Null),
            );
            state.insert(
                "entitlements".to_string(),
                serde_json::to_value(&self.catalog).unwrap_or(Value::Null),
            );
            self.sessions.insert(session_id.to_string(), state);
        }

        if let Some(profile) = user_profile {
            if let Some(state) = self.sessions.get_mut(session_id) {
                state.insert(
                    "user_profile".to_string(),
                    serde_json::to_value(profile).unwrap_or(Value::Null),
                );
            }
        }
    }

    /// Full state for a session, or an empty map for an unknown id. Unknown
    /// sessions are "no state yet", not an error.
    pub fn get(&self, session_id: &str) -> Map<String, Value> {
        self.sessions.get(session_id).cloned().unwrap_or_default()
    }

    /// Merge fields into a session (implicitly creating it), last write wins
    /// per key, and refresh `last_updated_at`.
    pub fn update(&mut self, session_id: &str, fields: Map<String, Value>) {
        let state = self.sessions.entry(session_id.to_string()).or_default();
        for (key, value) in fields {
            state.insert(key, value);
        }
        state.insert("last_updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(EntitlementCatalog::standard(), PricingTable::standard())
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use serde_json::{json, Map, Value};

    use super::SessionStore;
    use crate::registry::UserRegistry;

    fn fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
    }

    #[test]
    fn init_seeds_defaults_and_attaches_profile() {
        let registry = UserRegistry::with_demo_users();
        let alice = registry.find_by_username("alice").expect("alice exists");

        let mut store = SessionStore::default();
        store.init("s-1", Some(&alice));

        let state = store.get("s-1");
        assert!(state.contains_key("created_at"));
        assert_eq!(state["pricing"]["GOLD"], 300.0);
        assert!(state["entitlements"]["BRONZE"]["included"].is_array());
        assert_eq!(state["user_profile"]["uid"], "U1001");
    }

    #[test]
    fn reinit_preserves_created_at_and_only_attaches_profile() {
        let registry = UserRegistry::with_demo_users();
        let bob = registry.find_by_username("bob").expect("bob exists");

        let mut store = SessionStore::default();
        store.init("s-1", None);
        let created_at = store.get("s-1")["created_at"].clone();

        thread::sleep(Duration::from_millis(5));
        store.init("s-1", Some(&bob));

        let state = store.get("s-1");
        assert_eq!(state["created_at"], created_at);
        assert_eq!(state["user_profile"]["user_name"], "bob");

        // Re-init without a profile must not drop the attached one.
        store.init("s-1", None);
        assert_eq!(store.get("s-1")["user_profile"]["user_name"], "bob");
    }

    #[test]
    fn get_returns_empty_map_for_unknown_session() {
        let store = SessionStore::default();
        assert!(store.get("never-seen").is_empty());
    }

    #[test]
    fn update_merges_keys_and_advances_last_updated_at() {
        let mut store = SessionStore::default();
        store.update("s-2", fields(&[("a", json!(1))]));
        let first = store.get("s-2")["last_updated_at"].clone();

        thread::sleep(Duration::from_millis(5));
        store.update("s-2", fields(&[("b", json!(2))]));

        let state = store.get("s-2");
        assert_eq!(state["a"], 1);
        assert_eq!(state["b"], 2);
        let second = state["last_updated_at"].clone();
        assert!(
            second.as_str().expect("timestamp") > first.as_str().expect("timestamp"),
            "last_updated_at should advance"
        );
    }

    #[test]
    fn update_overwrites_per_key_last_write_wins() {
        let mut store = SessionStore::default();
        store.update("s-3", fields(&[("current_plan", json!("SILVER"))]));
        store.update("s-3", fields(&[("current_plan", json!("GOLD"))]));

        assert_eq!(store.get("s-3")["current_plan"], "GOLD");
    }
}
