use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use funda_agent::{build_llm_client, AgentRuntime};
use funda_core::config::{AppConfig, ConfigError, LoadOptions};
use funda_core::entitlements::catalog::EntitlementCatalog;
use funda_core::entitlements::resolver::EntitlementResolver;
use funda_core::errors::ApplicationError;
use funda_core::pricing::PricingTable;
use funda_core::registry::UserRegistry;
use funda_core::session::SessionStore;
use thiserror::Error;
use tracing::info;

use crate::state::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: Arc<AppState>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm client initialization failed: {0}")]
    Llm(#[source] ApplicationError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog = EntitlementCatalog::standard();
    let pricing = PricingTable::standard();
    let resolver = Arc::new(EntitlementResolver::new(&catalog));
    let registry = Arc::new(RwLock::new(UserRegistry::with_demo_users()));
    let sessions = Arc::new(RwLock::new(SessionStore::new(catalog, pricing.clone())));

    info!(
        event_name = "system.bootstrap.stores_ready",
        correlation_id = "bootstrap",
        indexed_reports = resolver.len(),
        demo_users = registry.read().map(|registry| registry.len()).unwrap_or(0),
        "entitlement index and demo registry initialized"
    );

    let llm = build_llm_client(&config.llm).map_err(BootstrapError::Llm)?;
    let runtime =
        AgentRuntime::new(resolver.clone(), registry.clone(), sessions.clone(), pricing, llm);

    let state = Arc::new(AppState {
        config: config.clone(),
        registry,
        sessions,
        conversations: RwLock::new(HashMap::new()),
        resolver,
        runtime,
    });

    Ok(Application { config, state })
}

#[cfg(test)]
mod tests {
    use funda_core::config::{AppConfig, ConfigOverrides, LlmProvider, LoadOptions};

    use super::{bootstrap, bootstrap_with_config};

    #[test]
    fn bootstrap_with_default_config_builds_populated_stores() {
        let app = bootstrap_with_config(AppConfig::default()).expect("bootstrap succeeds");

        assert!(!app.state.resolver.is_empty());
        assert_eq!(app.state.registry.read().expect("lock").len(), 13);
        assert!(app.state.sessions.read().expect("lock").is_empty());
    }

    #[test]
    fn bootstrap_fails_fast_on_gemini_without_api_key_at_validation() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_provider: Some(LlmProvider::Gemini),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        let message = match result {
            Ok(_) => String::new(),
            Err(error) => error.to_string(),
        };
        assert!(message.contains("llm.api_key"), "got: {message}");
    }
}
