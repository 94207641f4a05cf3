use std::sync::{Arc, RwLock};

use funda_core::domain::plan::PlanTier;
use funda_core::domain::report::{CoverageResult, CoverageStatus};
use funda_core::domain::user::UserProfile;
use funda_core::entitlements::resolver::EntitlementResolver;
use funda_core::errors::ApplicationError;
use funda_core::pricing::PricingTable;
use funda_core::registry::UserRegistry;
use funda_core::session::SessionStore;
use serde_json::{json, Map, Value};

use crate::llm::LlmClient;
use crate::prompts::{
    ACTION_INSTRUCTION, CONSENT_NOTICE, GLOBAL_INSTRUCTION, RECOMMENDATION_INSTRUCTION,
    SERVICE_INSTRUCTION,
};
use crate::routing::{route, scan_message, MessageScan, SubAgent};
use crate::tools::{CheckEntitlementTool, ToolRegistry, UpdateDataPlanTool};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReply {
    pub agent: SubAgent,
    pub text: String,
}

/// Orchestrates one message: scan, entitlement classification, session-state
/// sync, sub-agent reply, optional model phrasing pass.
pub struct AgentRuntime {
    resolver: Arc<EntitlementResolver>,
    registry: Arc<RwLock<UserRegistry>>,
    sessions: Arc<RwLock<SessionStore>>,
    pricing: PricingTable,
    tools: ToolRegistry,
    llm: Option<Arc<dyn LlmClient>>,
}

impl AgentRuntime {
    pub fn new(
        resolver: Arc<EntitlementResolver>,
        registry: Arc<RwLock<UserRegistry>>,
        sessions: Arc<RwLock<SessionStore>>,
        pricing: PricingTable,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        let mut tools = ToolRegistry::default();
        tools.register(CheckEntitlementTool::new(resolver.clone()));
        tools.register(UpdateDataPlanTool::new(registry.clone(), sessions.clone()));

        Self { resolver, registry, sessions, pricing, tools, llm }
    }

    pub async fn handle_message(
        &self,
        session_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<AgentReply, ApplicationError> {
        let state = self.session_state(session_id)?;

        let profile = state
            .get("user_profile")
            .and_then(|value| serde_json::from_value::<UserProfile>(value.clone()).ok())
            .or_else(|| self.lookup_profile(user_id));

        let current_plan = state
            .get("current_plan")
            .and_then(Value::as_str)
            .and_then(|value| value.parse::<PlanTier>().ok())
            .or_else(|| profile.as_ref().map(|profile| profile.data_plan))
            .unwrap_or(PlanTier::Bronze);

        let pending_upgrade = state
            .get("pending_upgrade")
            .and_then(Value::as_str)
            .and_then(|value| value.parse::<PlanTier>().ok());

        let scan = scan_message(text, &self.resolver);

        // Fall back to the last mentioned report so follow-ups like "how do
        // I download it?" keep their subject.
        let report = scan
            .report
            .clone()
            .or_else(|| state.get("report_name").and_then(Value::as_str).map(String::from));
        let coverage =
            report.as_deref().map(|name| self.resolver.check_entitlement(name, current_plan));

        self.sync_session(session_id, current_plan, report.as_deref(), coverage.as_ref())?;

        let agent = route(&scan, pending_upgrade.is_some(), coverage.as_ref());
        tracing::debug!(
            event_name = "agent.route",
            session_id,
            agent = agent.as_str(),
            report = report.as_deref().unwrap_or("none"),
            "routed user message"
        );

        let draft = match agent {
            SubAgent::Action => {
                self.action_reply(session_id, profile.as_ref(), current_plan, &scan, pending_upgrade)
                    .await?
            }
            SubAgent::Recommendation => {
                self.recommendation_reply(current_plan, coverage.as_ref())
            }
            SubAgent::Service => {
                self.service_reply(profile.as_ref(), current_plan, coverage.as_ref())
            }
        };

        let text = self.polish(agent, draft).await;
        Ok(AgentReply { agent, text })
    }

    fn session_state(&self, session_id: &str) -> Result<Map<String, Value>, ApplicationError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| ApplicationError::Integration("session store lock poisoned".into()))?;
        Ok(sessions.get(session_id))
    }

    fn lookup_profile(&self, user_id: &str) -> Option<UserProfile> {
        self.registry.read().ok()?.find_by_username(user_id)
    }

    fn sync_session(
        &self,
        session_id: &str,
        current_plan: PlanTier,
        report: Option<&str>,
        coverage: Option<&CoverageResult>,
    ) -> Result<(), ApplicationError> {
        let mut fields = Map::new();
        fields.insert("current_plan".to_string(), json!(current_plan));
        if let Some(report) = report {
            fields.insert("report_name".to_string(), json!(report));
        }
        if let Some(coverage) = coverage {
            if coverage.lowest_plan.is_some() {
                fields.insert("product_name".to_string(), json!(coverage.canonical_report));
            }
            fields.insert(
                "entitlement_check".to_string(),
                serde_json::to_value(coverage).unwrap_or(Value::Null),
            );
        }

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ApplicationError::Integration("session store lock poisoned".into()))?;
        sessions.update(session_id, fields);
        Ok(())
    }

    fn set_session_field(
        &self,
        session_id: &str,
        key: &str,
        value: Value,
    ) -> Result<(), ApplicationError> {
        let mut fields = Map::new();
        fields.insert(key.to_string(), value);
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| ApplicationError::Integration("session store lock poisoned".into()))?;
        sessions.update(session_id, fields);
        Ok(())
    }

    async fn action_reply(
        &self,
        session_id: &str,
        profile: Option<&UserProfile>,
        current_plan: PlanTier,
        scan: &MessageScan,
        pending_upgrade: Option<PlanTier>,
    ) -> Result<String, ApplicationError> {
        if let (Some(target), true) = (pending_upgrade, scan.confirmation) {
            return self.execute_upgrade(session_id, profile, target).await;
        }

        if scan.downgrade_intent
            || scan.target_tier.map(|target| target < current_plan).unwrap_or(false)
        {
            return Ok(format!(
                "Plan changes here only support upgrades, so I can't move you below your \
                 current {current_plan} plan. Please contact Fargo Bank support to arrange a \
                 downgrade."
            ));
        }

        match scan.target_tier {
            Some(target) if target == current_plan => Ok(format!(
                "You're already on the {current_plan} plan, so no change is needed."
            )),
            Some(target) => {
                self.set_session_field(session_id, "pending_upgrade", json!(target))?;
                Ok(format!(
                    "You're currently on {current_plan} (${}/month). Upgrading to {target} costs \
                     ${}/month. Reply 'confirm' to proceed with the upgrade.",
                    self.pricing.monthly(current_plan),
                    self.pricing.monthly(target),
                ))
            }
            None => Ok(format!(
                "Happy to help with a plan change. You're on {current_plan} today. Monthly \
                 pricing: BRONZE ${}, SILVER ${}, GOLD ${}. Which plan would you like?",
                self.pricing.bronze, self.pricing.silver, self.pricing.gold,
            )),
        }
    }

    async fn execute_upgrade(
        &self,
        session_id: &str,
        profile: Option<&UserProfile>,
        target: PlanTier,
    ) -> Result<String, ApplicationError> {
        self.set_session_field(session_id, "pending_upgrade", Value::Null)?;

        let Some(profile) = profile else {
            return Ok(
                "I couldn't find your user profile, so the upgrade was not applied. Please \
                 sign in again and retry."
                    .to_string(),
            );
        };

        let input = json!({
            "uid": profile.uid,
            "plan": target.as_str(),
            "session_id": session_id,
        });
        let output = self
            .tools
            .execute("update_user_dataplan", input)
            .await
            .map_err(|error| ApplicationError::Integration(error.to_string()))?;

        let message = output["message"].as_str().unwrap_or_default().to_string();
        if output["success"].as_bool().unwrap_or(false) {
            tracing::info!(
                event_name = "agent.plan_upgraded",
                session_id,
                uid = %profile.uid,
                plan = target.as_str(),
                "plan upgrade applied"
            );
            Ok(format!("{message} {CONSENT_NOTICE}"))
        } else {
            Ok(message)
        }
    }

    fn recommendation_reply(
        &self,
        current_plan: PlanTier,
        coverage: Option<&CoverageResult>,
    ) -> String {
        let Some(coverage) = coverage else {
            return "I can recommend the right plan once you tell me which report you need."
                .to_string();
        };

        match (coverage.status, coverage.lowest_plan) {
            (CoverageStatus::Paid, _) => format!(
                "\"{}\" is a paid add-on and isn't part of any tier subscription, including \
                 {current_plan}. It can be purchased separately on your current plan - would \
                 you like the add-on order steps?",
                coverage.canonical_report,
            ),
            (_, Some(lowest_plan)) => {
                let delta = self.pricing.upgrade_delta(current_plan, lowest_plan);
                format!(
                    "Your {current_plan} plan doesn't include \"{}\". The lowest plan that \
                     covers it is {lowest_plan} at ${}/month, ${delta} more than your current \
                     ${}/month. Would you like to upgrade?",
                    coverage.canonical_report,
                    self.pricing.monthly(lowest_plan),
                    self.pricing.monthly(current_plan),
                )
            }
            _ => format!(
                "I couldn't find \"{}\" in the report catalog, so I can't price an upgrade \
                 for it.",
                coverage.canonical_report,
            ),
        }
    }

    fn service_reply(
        &self,
        profile: Option<&UserProfile>,
        current_plan: PlanTier,
        coverage: Option<&CoverageResult>,
    ) -> String {
        match coverage {
            Some(coverage) if coverage.status == CoverageStatus::Included => format!(
                "\"{}\" is included in your {current_plan} plan. In the Fargo Bank portal open \
                 Reports, search for \"{}\", pick the statement period, and choose Download.",
                coverage.canonical_report, coverage.canonical_report,
            ),
            Some(coverage) if coverage.status == CoverageStatus::NotFound => format!(
                "I couldn't find a report called \"{}\" in the catalog. Could you double-check \
                 the report name?",
                coverage.canonical_report,
            ),
            Some(coverage) => format!(
                "\"{}\" isn't part of your {current_plan} plan yet - I can walk you through \
                 the upgrade options if you'd like.",
                coverage.canonical_report,
            ),
            None => {
                let greeting = profile
                    .map(|profile| format!("Hi {}! ", profile.user_name))
                    .unwrap_or_default();
                format!(
                    "{greeting}I'm Fargo Funda. I can check whether a report is covered by \
                     your plan, recommend the right tier for a report, and handle plan \
                     upgrades. Which report are you interested in?"
                )
            }
        }
    }

    /// Optional phrasing pass. A model failure degrades to the deterministic
    /// draft rather than failing the request.
    async fn polish(&self, agent: SubAgent, draft: String) -> String {
        let Some(llm) = &self.llm else {
            return draft;
        };

        let instruction = match agent {
            SubAgent::Action => ACTION_INSTRUCTION,
            SubAgent::Recommendation => RECOMMENDATION_INSTRUCTION,
            SubAgent::Service => SERVICE_INSTRUCTION,
        };
        let instruction = format!("{GLOBAL_INSTRUCTION}\n\n{instruction}");

        match llm.complete(&instruction, &draft).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => draft,
            Err(error) => {
                tracing::warn!(
                    event_name = "agent.llm.fallback",
                    agent = agent.as_str(),
                    error = %error,
                    "model phrasing failed; using deterministic draft"
                );
                draft
            }
        }
    }
}
