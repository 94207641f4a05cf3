use funda_core::domain::plan::PlanTier;
use funda_core::entitlements::catalog::EntitlementCatalog;
use funda_core::entitlements::resolver::EntitlementResolver;

use crate::commands::CommandResult;

pub fn run(report: &str, plan: &str) -> CommandResult {
    let plan: PlanTier = match plan.parse() {
        Ok(plan) => plan,
        Err(error) => {
            return CommandResult::failure("check", "invalid_plan", error.to_string(), 2);
        }
    };

    let resolver = EntitlementResolver::new(&EntitlementCatalog::standard());
    let result = resolver.check_entitlement(report, plan);

    match serde_json::to_string_pretty(&result) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure(
            "check",
            "serialization",
            format!("coverage result serialization failed: {error}"),
            3,
        ),
    }
}
