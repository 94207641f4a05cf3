use funda_core::registry::UserRegistry;

pub fn run() -> String {
    let registry = UserRegistry::with_demo_users();
    serde_json::to_string_pretty(&registry.list())
        .unwrap_or_else(|error| format!("user listing serialization failed: {error}"))
}
