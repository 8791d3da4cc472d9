use std::env;
use std::fs;
use std::path::Path;

use arcos_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", &["ARCOS_DATABASE_URL"]),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", &["ARCOS_DATABASE_MAX_CONNECTIONS"]),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", &["ARCOS_DATABASE_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", &["ARCOS_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", &["ARCOS_SERVER_PORT", "PORT"]),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", &["ARCOS_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ));

    lines.push(render_line(
        "automation.webhook_url",
        config.automation.webhook_url.as_deref().unwrap_or("<unset>"),
        source("automation.webhook_url", &["ARCOS_AUTOMATION_WEBHOOK_URL"]),
    ));
    lines.push(render_line(
        "automation.timeout_secs",
        &config.automation.timeout_secs.to_string(),
        source("automation.timeout_secs", &["ARCOS_AUTOMATION_TIMEOUT_SECS"]),
    ));
    lines.push(render_line(
        "automation.source",
        &config.automation.source,
        source("automation.source", &["ARCOS_AUTOMATION_SOURCE"]),
    ));
    lines.push(render_line(
        "automation.outbound_secret",
        &redact_secret(config.automation.outbound_secret.as_ref()),
        source("automation.outbound_secret", &["ARCOS_AUTOMATION_OUTBOUND_SECRET"]),
    ));
    lines.push(render_line(
        "automation.inbound_secret",
        &redact_secret(config.automation.inbound_secret.as_ref()),
        source("automation.inbound_secret", &["ARCOS_AUTOMATION_INBOUND_SECRET"]),
    ));

    lines.push(render_line(
        "session.max_history_messages",
        &config.session.max_history_messages.to_string(),
        source("session.max_history_messages", &["ARCOS_SESSION_MAX_HISTORY_MESSAGES"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["ARCOS_LOGGING_LEVEL", "ARCOS_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["ARCOS_LOGGING_FORMAT", "ARCOS_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret {
        None => "<unset>".to_string(),
        Some(secret) if secret.expose_secret().trim().is_empty() => "<empty>".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use toml::Value;

    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_never_render_in_plain_text() {
        let secret: SecretString = "hook-secret".to_string().into();
        assert_eq!(redact_secret(Some(&secret)), "<redacted>");
        assert_eq!(redact_secret(None), "<unset>");
    }

    #[test]
    fn nested_key_paths_are_detected() {
        let doc = "[automation]\nwebhook_url = \"https://hooks.example.com\"\n"
            .parse::<Value>()
            .expect("toml");
        assert!(contains_path(&doc, "automation.webhook_url"));
        assert!(!contains_path(&doc, "automation.timeout_secs"));
        assert!(!contains_path(&doc, "database.url"));
    }
}
