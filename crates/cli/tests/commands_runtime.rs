use std::env;
use std::sync::{Mutex, OnceLock};

use funda_cli::commands::{check, doctor, users};
use serde_json::Value;

#[test]
fn check_prints_the_coverage_contract_for_a_known_report() {
    let result = check::run("Credit   Report", "silver");
    assert_eq!(result.exit_code, 0, "expected successful check");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "included");
    assert_eq!(payload["current_plan"], "SILVER");
    assert_eq!(payload["canonical_report"], "credit report");
}

#[test]
fn check_surfaces_unknown_reports_as_not_found() {
    let result = check::run("totally-unlisted-report-xyz", "GOLD");
    assert_eq!(result.exit_code, 0, "not_found is a classification, not a failure");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["status"], "not_found");
    assert!(payload["lowest_plan"].is_null());
}

#[test]
fn check_rejects_an_invalid_plan() {
    let result = check::run("Credit Report", "PLATINUM");
    assert_eq!(result.exit_code, 2, "expected invalid plan failure code");

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "check");
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "invalid_plan");
}

#[test]
fn doctor_passes_with_default_environment() {
    with_env(&[], || {
        let output = doctor::run(true);
        let payload = parse_payload(&output);

        assert_eq!(payload["overall_status"], "pass");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|check| check["status"] == "pass"));
    });
}

#[test]
fn doctor_fails_when_configuration_is_invalid() {
    with_env(&[("FUNDA_LOG_LEVEL", "chatty")], || {
        let output = doctor::run(true);
        let payload = parse_payload(&output);

        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["name"], "config_validation");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

#[test]
fn users_lists_the_demo_registry() {
    let output = users::run();
    let payload = parse_payload(&output);

    let profiles = payload.as_array().expect("profiles array");
    assert_eq!(profiles.len(), 13);
    assert_eq!(profiles[0]["uid"], "U1001");
    assert_eq!(profiles[0]["user_name"], "alice");
    assert_eq!(profiles[0]["data_plan"], "GOLD");
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).unwrap_or_else(|error| {
        panic!("expected JSON output, got error {error} for output: {output}")
    })
}

fn with_env(vars: &[(&str, &str)], test: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    for (key, value) in vars {
        env::set_var(key, value);
    }
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(test));
    for (key, _) in vars {
        env::remove_var(key);
    }
    if let Err(panic) = result {
        std::panic::resume_unwind(panic);
    }
}
