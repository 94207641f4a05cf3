use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub entitlement_index: HealthCheck,
    pub user_registry: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let entitlement_index = index_check(&state);
    let user_registry = registry_check(&state);
    let ready = entitlement_index.status == "ready" && user_registry.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "funda-server runtime initialized".to_string(),
        },
        entitlement_index,
        user_registry,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn index_check(state: &AppState) -> HealthCheck {
    if state.resolver.is_empty() {
        return HealthCheck {
            status: "degraded",
            detail: "entitlement index is empty".to_string(),
        };
    }
    HealthCheck {
        status: "ready",
        detail: format!("{} reports indexed", state.resolver.len()),
    }
}

fn registry_check(state: &AppState) -> HealthCheck {
    let registry = match state.registry.read() {
        Ok(registry) => registry,
        Err(_) => {
            return HealthCheck {
                status: "degraded",
                detail: "user registry lock poisoned".to_string(),
            }
        }
    };

    if registry.is_empty() {
        return HealthCheck { status: "degraded", detail: "user registry is empty".to_string() };
    }

    // Both indexes must resolve the same record.
    let consistent = registry.list().iter().all(|profile| {
        registry
            .find_by_username(&profile.user_name)
            .map(|found| found.uid == profile.uid)
            .unwrap_or(false)
    });
    if !consistent {
        return HealthCheck {
            status: "degraded",
            detail: "username and uid indexes disagree".to_string(),
        };
    }

    HealthCheck { status: "ready", detail: format!("{} users registered", registry.len()) }
}
