use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use funda_core::domain::plan::PlanTier;
use funda_core::entitlements::resolver::EntitlementResolver;
use funda_core::registry::UserRegistry;
use funda_core::session::SessionStore;
use serde_json::{json, Map, Value};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub async fn execute(&self, name: &str, input: Value) -> Result<Value> {
        let tool = self.tools.get(name).ok_or_else(|| anyhow!("unknown tool `{name}`"))?;
        tool.execute(input).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Tool: classify a report under a plan. Input `{report, plan}`; output is
/// the serialized coverage result.
pub struct CheckEntitlementTool {
    resolver: Arc<EntitlementResolver>,
}

impl CheckEntitlementTool {
    pub fn new(resolver: Arc<EntitlementResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Tool for CheckEntitlementTool {
    fn name(&self) -> &'static str {
        "check_entitlement"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let report = input["report"].as_str().context("`report` must be a string")?;
        let plan: PlanTier = input["plan"]
            .as_str()
            .context("`plan` must be a string")?
            .parse()
            .context("`plan` must be a known tier")?;

        let result = self.resolver.check_entitlement(report, plan);
        serde_json::to_value(result).context("coverage result serialization")
    }
}

/// Tool: update a user's data plan by uid, mirroring the registry's
/// value-based failure convention into `{success, message}`. When a session
/// id is supplied, a successful change is written back to that session's
/// `current_plan`.
pub struct UpdateDataPlanTool {
    registry: Arc<RwLock<UserRegistry>>,
    sessions: Arc<RwLock<SessionStore>>,
}

impl UpdateDataPlanTool {
    pub fn new(registry: Arc<RwLock<UserRegistry>>, sessions: Arc<RwLock<SessionStore>>) -> Self {
        Self { registry, sessions }
    }
}

#[async_trait]
impl Tool for UpdateDataPlanTool {
    fn name(&self) -> &'static str {
        "update_user_dataplan"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let uid = input["uid"].as_str().context("`uid` must be a string")?;
        let plan = input["plan"].as_str().context("`plan` must be a string")?;
        let session_id = input["session_id"].as_str();

        let success = {
            let mut registry = match self.registry.write() {
                Ok(registry) => registry,
                Err(_) => bail!("user registry lock is poisoned"),
            };
            registry.set_plan(uid, plan)
        };

        if !success {
            return Ok(json!({
                "success": false,
                "message": "Unable to update plan. Verify UID and plan (GOLD/SILVER/BRONZE).",
            }));
        }

        let plan_upper = plan.trim().to_ascii_uppercase();
        if let Some(session_id) = session_id {
            let mut fields = Map::new();
            fields.insert("current_plan".to_string(), Value::String(plan_upper.clone()));
            let mut sessions = match self.sessions.write() {
                Ok(sessions) => sessions,
                Err(_) => bail!("session store lock is poisoned"),
            };
            sessions.update(session_id, fields);
        }

        Ok(json!({
            "success": true,
            "message": format!("Plan updated to {plan_upper} for user {uid}."),
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, RwLock};

    use funda_core::entitlements::catalog::EntitlementCatalog;
    use funda_core::entitlements::resolver::EntitlementResolver;
    use funda_core::registry::UserRegistry;
    use funda_core::session::SessionStore;
    use serde_json::json;

    use super::{CheckEntitlementTool, Tool, ToolRegistry, UpdateDataPlanTool};

    fn registry_with_tools(
    ) -> (ToolRegistry, Arc<RwLock<UserRegistry>>, Arc<RwLock<SessionStore>>) {
        let resolver = Arc::new(EntitlementResolver::new(&EntitlementCatalog::standard()));
        let users = Arc::new(RwLock::new(UserRegistry::with_demo_users()));
        let sessions = Arc::new(RwLock::new(SessionStore::default()));

        let mut tools = ToolRegistry::default();
        tools.register(CheckEntitlementTool::new(resolver));
        tools.register(UpdateDataPlanTool::new(users.clone(), sessions.clone()));

        (tools, users, sessions)
    }

    #[tokio::test]
    async fn check_entitlement_tool_returns_the_coverage_contract() {
        let (tools, _, _) = registry_with_tools();

        let output = tools
            .execute("check_entitlement", json!({"report": "Credit  Report", "plan": "silver"}))
            .await
            .expect("tool run");

        assert_eq!(output["status"], "included");
        assert_eq!(output["current_plan"], "SILVER");
        assert_eq!(output["canonical_report"], "credit report");
    }

    #[tokio::test]
    async fn update_tool_reports_failure_for_bad_plan() {
        let (tools, users, _) = registry_with_tools();

        let output = tools
            .execute("update_user_dataplan", json!({"uid": "U1001", "plan": "PLATINUM"}))
            .await
            .expect("tool run");

        assert_eq!(output["success"], false);
        let alice = users.read().expect("lock").find_by_uid("U1001").expect("profile");
        assert_eq!(alice.data_plan.as_str(), "GOLD");
    }

    #[tokio::test]
    async fn update_tool_mutates_registry_and_session_plan() {
        let (tools, users, sessions) = registry_with_tools();
        sessions.write().expect("lock").init("s-1", None);

        let output = tools
            .execute(
                "update_user_dataplan",
                json!({"uid": "U1003", "plan": "silver", "session_id": "s-1"}),
            )
            .await
            .expect("tool run");

        assert_eq!(output["success"], true);
        assert_eq!(output["message"], "Plan updated to SILVER for user U1003.");

        let charlie = users.read().expect("lock").find_by_uid("U1003").expect("profile");
        assert_eq!(charlie.data_plan.as_str(), "SILVER");
        assert_eq!(sessions.read().expect("lock").get("s-1")["current_plan"], "SILVER");
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let (tools, _, _) = registry_with_tools();
        assert!(tools.execute("no_such_tool", json!({})).await.is_err());
    }
}
