use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use funda_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|value| redact_secret(value.expose_secret()))
        .unwrap_or_else(|| "(unset)".to_string());

    let fields: [(&str, String, Option<&str>); 11] = [
        ("llm.provider", format!("{:?}", config.llm.provider), Some("FUNDA_LLM_PROVIDER")),
        ("llm.api_key", api_key, Some("FUNDA_LLM_API_KEY")),
        ("llm.model", config.llm.model.clone(), Some("FUNDA_LLM_MODEL")),
        (
            "llm.project",
            config.llm.project.clone().unwrap_or_else(|| "(unset)".to_string()),
            Some("FUNDA_LLM_PROJECT"),
        ),
        ("llm.location", config.llm.location.clone(), Some("FUNDA_LLM_LOCATION")),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), Some("FUNDA_LLM_TIMEOUT_SECS")),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            Some("FUNDA_SERVER_BIND_ADDRESS"),
        ),
        ("server.port", config.server.port.to_string(), Some("FUNDA_SERVER_PORT")),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            Some("FUNDA_SERVER_GRACEFUL_SHUTDOWN_SECS"),
        ),
        ("logging.level", config.logging.level.clone(), Some("FUNDA_LOGGING_LEVEL")),
        ("logging.format", format!("{:?}", config.logging.format), Some("FUNDA_LOGGING_FORMAT")),
    ];

    for (field, value, env_var) in fields {
        lines.push(render_line(
            field,
            &value,
            field_source(field, env_var, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }

    lines.join("\n")
}

fn render_line(field: &str, value: &str, source: String) -> String {
    format!("{field} = {value}  [{source}]")
}

fn field_source(
    field: &str,
    env_var: Option<&str>,
    file_doc: Option<&Value>,
    file_path: Option<&Path>,
) -> String {
    if let Some(env_var) = env_var {
        let set = env::var(env_var).map(|value| !value.trim().is_empty()).unwrap_or(false);
        if set {
            return format!("env:{env_var}");
        }
    }

    if let (Some(doc), Some(path)) = (file_doc, file_path) {
        if file_defines(doc, field) {
            return format!("file:{}", path.display());
        }
    }

    "default".to_string()
}

fn file_defines(doc: &Value, field: &str) -> bool {
    let mut current = doc;
    for part in field.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("funda.toml"), PathBuf::from("config/funda.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn redact_secret(value: &str) -> String {
    if value.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &value[..4])
}

#[cfg(test)]
mod tests {
    use super::redact_secret;

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(redact_secret("abc"), "****");
    }

    #[test]
    fn long_secrets_keep_a_short_prefix() {
        assert_eq!(redact_secret("abcdef123456"), "abcd****");
    }
}
