use funda_core::domain::plan::PlanTier;
use funda_core::domain::report::{normalize_report, CoverageResult, CoverageStatus};
use funda_core::entitlements::resolver::EntitlementResolver;

/// The three sub-agent behaviors a message can route to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubAgent {
    Action,
    Recommendation,
    Service,
}

impl SubAgent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action_agent",
            Self::Recommendation => "recommendation_agent",
            Self::Service => "service_agent",
        }
    }
}

/// Deterministic keyword/catalog scan of one user message. This is the whole
/// extent of language understanding in the system: word lists for plan-change
/// intent and confirmation, plus catalog-name matching for reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageScan {
    pub upgrade_intent: bool,
    pub downgrade_intent: bool,
    pub confirmation: bool,
    pub target_tier: Option<PlanTier>,
    pub report: Option<String>,
}

const UPGRADE_PHRASES: &[&str] =
    &["upgrade", "change my plan", "switch my plan", "switch to", "move to", "move up"];

const DOWNGRADE_PHRASES: &[&str] = &["downgrade", "move down", "cheaper plan", "lower plan"];

const CONFIRMATION_WORDS: &[&str] = &["yes", "confirm", "confirmed", "proceed", "sure"];

const CONFIRMATION_PHRASES: &[&str] = &["go ahead", "do it", "sounds good"];

pub fn scan_message(text: &str, resolver: &EntitlementResolver) -> MessageScan {
    // Report names and messages share one normalization, so catalog matching
    // is a plain substring test.
    let normalized = normalize_report(text);
    let words: Vec<&str> = normalized.split(' ').collect();

    let upgrade_intent = UPGRADE_PHRASES.iter().any(|phrase| normalized.contains(phrase));
    let downgrade_intent = DOWNGRADE_PHRASES.iter().any(|phrase| normalized.contains(phrase));
    let confirmation = CONFIRMATION_WORDS.iter().any(|word| words.contains(word))
        || CONFIRMATION_PHRASES.iter().any(|phrase| normalized.contains(phrase));

    let target_tier = words.iter().find_map(|word| match *word {
        "gold" => Some(PlanTier::Gold),
        "silver" => Some(PlanTier::Silver),
        "bronze" => Some(PlanTier::Bronze),
        _ => None,
    });

    // Longest catalog match wins so "wire transfer report" is not shadowed
    // by a shorter name it happens to contain.
    let report = resolver
        .canonical_reports()
        .chain(resolver.paid_reports())
        .filter(|name| normalized.contains(name))
        .max_by_key(|name| name.len())
        .map(|name| name.to_string());

    MessageScan { upgrade_intent, downgrade_intent, confirmation, target_tier, report }
}

/// Routing rules: plan-change intent (or a confirmation while an upgrade is
/// pending) goes to action; a report the plan does not include goes to
/// recommendation; everything else, including unknown reports and small talk,
/// is handled by service.
pub fn route(
    scan: &MessageScan,
    upgrade_pending: bool,
    coverage: Option<&CoverageResult>,
) -> SubAgent {
    if scan.upgrade_intent || scan.downgrade_intent || (upgrade_pending && scan.confirmation) {
        return SubAgent::Action;
    }

    match coverage.map(|result| result.status) {
        Some(CoverageStatus::Included) => SubAgent::Service,
        Some(CoverageStatus::Optional) | Some(CoverageStatus::Paid) => SubAgent::Recommendation,
        Some(CoverageStatus::NotFound) | None => SubAgent::Service,
    }
}

#[cfg(test)]
mod tests {
    use funda_core::domain::plan::PlanTier;
    use funda_core::entitlements::catalog::EntitlementCatalog;
    use funda_core::entitlements::resolver::EntitlementResolver;

    use super::{route, scan_message, SubAgent};

    fn resolver() -> EntitlementResolver {
        EntitlementResolver::new(&EntitlementCatalog::standard())
    }

    #[test]
    fn detects_upgrade_intent_and_target_tier() {
        let scan = scan_message("I'd like to upgrade to GOLD please", &resolver());
        assert!(scan.upgrade_intent);
        assert_eq!(scan.target_tier, Some(PlanTier::Gold));
        assert!(!scan.confirmation);
    }

    #[test]
    fn detects_confirmation_words() {
        let scan = scan_message("Yes, go ahead", &resolver());
        assert!(scan.confirmation);
        assert!(!scan.upgrade_intent);
    }

    #[test]
    fn matches_longest_catalog_report_name() {
        let scan = scan_message("where do I find the Wire   Transfer Report?", &resolver());
        assert_eq!(scan.report.as_deref(), Some("wire transfer report"));
    }

    #[test]
    fn matches_paid_only_reports_too() {
        let scan = scan_message("I need the regulatory audit extract", &resolver());
        assert_eq!(scan.report.as_deref(), Some("regulatory audit extract"));
    }

    #[test]
    fn upgrade_intent_routes_to_action_even_with_a_report_mention() {
        let resolver = resolver();
        let scan = scan_message("upgrade me so I can see the credit report", &resolver);
        let coverage = resolver.check_entitlement("credit report", PlanTier::Bronze);
        assert_eq!(route(&scan, false, Some(&coverage)), SubAgent::Action);
    }

    #[test]
    fn included_report_routes_to_service() {
        let resolver = resolver();
        let scan = scan_message("show me my account statement", &resolver);
        let coverage = resolver.check_entitlement("account statement", PlanTier::Bronze);
        assert_eq!(route(&scan, false, Some(&coverage)), SubAgent::Service);
    }

    #[test]
    fn uncovered_report_routes_to_recommendation() {
        let resolver = resolver();
        let scan = scan_message("can I get portfolio performance?", &resolver);
        let coverage = resolver.check_entitlement("portfolio performance", PlanTier::Silver);
        assert_eq!(route(&scan, false, Some(&coverage)), SubAgent::Recommendation);
    }

    #[test]
    fn paid_only_report_routes_to_recommendation() {
        let resolver = resolver();
        let coverage = resolver.check_entitlement("fraud risk assessment", PlanTier::Gold);
        let scan = scan_message("fraud risk assessment please", &resolver);
        assert_eq!(route(&scan, false, Some(&coverage)), SubAgent::Recommendation);
    }

    #[test]
    fn confirmation_routes_to_action_only_while_an_upgrade_is_pending() {
        let scan = scan_message("yes", &resolver());
        assert_eq!(route(&scan, true, None), SubAgent::Action);
        assert_eq!(route(&scan, false, None), SubAgent::Service);
    }
}
