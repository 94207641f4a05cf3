use funda_core::config::{AppConfig, LoadOptions};
use funda_core::domain::plan::PlanTier;
use funda_core::domain::report::CoverageStatus;
use funda_core::entitlements::catalog::EntitlementCatalog;
use funda_core::entitlements::resolver::EntitlementResolver;
use funda_core::registry::UserRegistry;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(_) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_entitlement_index());
            checks.push(check_user_registry());
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "entitlement_index",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "user_registry",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_entitlement_index() -> DoctorCheck {
    let resolver = EntitlementResolver::new(&EntitlementCatalog::standard());

    if resolver.is_empty() {
        return DoctorCheck {
            name: "entitlement_index",
            status: CheckStatus::Fail,
            details: "entitlement index built empty".to_string(),
        };
    }

    // Spot-check one classification from each side of the index.
    let included = resolver.check_entitlement("Account Statement", PlanTier::Bronze);
    let paid = resolver.check_entitlement("Regulatory Audit Extract", PlanTier::Gold);
    if included.status != CoverageStatus::Included || paid.status != CoverageStatus::Paid {
        return DoctorCheck {
            name: "entitlement_index",
            status: CheckStatus::Fail,
            details: "index spot checks returned unexpected classifications".to_string(),
        };
    }

    DoctorCheck {
        name: "entitlement_index",
        status: CheckStatus::Pass,
        details: format!("{} reports indexed", resolver.len()),
    }
}

fn check_user_registry() -> DoctorCheck {
    let registry = UserRegistry::with_demo_users();

    if registry.is_empty() {
        return DoctorCheck {
            name: "user_registry",
            status: CheckStatus::Fail,
            details: "demo registry seeded empty".to_string(),
        };
    }

    let consistent = registry.list().iter().all(|profile| {
        registry
            .find_by_username(&profile.user_name)
            .map(|found| found.uid == profile.uid)
            .unwrap_or(false)
    });
    if !consistent {
        return DoctorCheck {
            name: "user_registry",
            status: CheckStatus::Fail,
            details: "username and uid indexes disagree".to_string(),
        };
    }

    DoctorCheck {
        name: "user_registry",
        status: CheckStatus::Pass,
        details: format!("{} demo users seeded", registry.len()),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
