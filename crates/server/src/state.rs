use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use funda_agent::AgentRuntime;
use funda_core::config::AppConfig;
use funda_core::entitlements::resolver::EntitlementResolver;
use funda_core::errors::InterfaceError;
use funda_core::registry::UserRegistry;
use funda_core::session::SessionStore;
use serde::Serialize;
use serde_json::json;

/// Process-scoped application state, constructed once at bootstrap and handed
/// to every handler. Stores are plain in-memory maps; the locks serialize
/// concurrent handlers touching the same store.
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<RwLock<UserRegistry>>,
    pub sessions: Arc<RwLock<SessionStore>>,
    pub conversations: RwLock<HashMap<String, Vec<ChatTurn>>>,
    pub resolver: Arc<EntitlementResolver>,
    pub runtime: AgentRuntime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: &'static str,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant", content: content.into() }
    }
}

/// HTTP-facing wrapper around the core error taxonomy.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self(value)
    }
}

impl ApiError {
    pub fn unknown_session(session_id: &str) -> Self {
        Self(InterfaceError::NotFound {
            message: "Unknown session_id".to_string(),
            correlation_id: session_id.to_string(),
        })
    }

    pub fn lock_poisoned(correlation_id: &str) -> Self {
        Self(InterfaceError::Internal {
            message: "shared state lock poisoned".to_string(),
            correlation_id: correlation_id.to_string(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::warn!(
            event_name = "system.http.error",
            status = %status,
            error = %self.0,
            "request failed"
        );

        (status, Json(json!({ "detail": self.0.user_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::ApiError;

    #[test]
    fn unknown_session_maps_to_404() {
        let response = ApiError::unknown_session("s-1").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn lock_poisoning_maps_to_500() {
        let response = ApiError::lock_poisoned("s-1").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
