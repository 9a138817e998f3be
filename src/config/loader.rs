//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{ApmConfig, AppConfig};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

pub const ENV_CREDENTIAL: &str = "APM_CREDENTIAL";
pub const ENV_APP_NAME: &str = "APM_APP_NAME";
pub const ENV_ENABLED: &str = "APM_ENABLED";
pub const ENV_TRANSPORT: &str = "APM_TRANSPORT";

/// Load configuration from a TOML file, then apply `APM_*` environment overrides.
///
/// APM semantics are not validated here; the middleware degrades to
/// pass-through on its own when the APM section is unusable.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let mut config = read_config(path)?;
    apply_env_overrides(&mut config.apm, |key| std::env::var(key).ok());
    Ok(config)
}

/// Read and parse a TOML config file without environment overrides.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Apply `APM_*` overrides using the given variable lookup.
pub fn apply_env_overrides<F>(config: &mut ApmConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(credential) = lookup(ENV_CREDENTIAL) {
        config.credential = credential;
    }
    if let Some(app_name) = lookup(ENV_APP_NAME) {
        config.app_name = app_name;
    }
    if let Some(transport) = lookup(ENV_TRANSPORT) {
        config.transport = transport;
    }
    if let Some(enabled) = lookup(ENV_ENABLED) {
        match parse_bool(&enabled) {
            Some(value) => config.enabled = value,
            None => tracing::warn!(
                variable = ENV_ENABLED,
                value = %enabled,
                "Ignoring unparseable boolean override"
            ),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ApmConfig::default();
        apply_env_overrides(
            &mut config,
            lookup_from(&[
                (ENV_CREDENTIAL, "from-env"),
                (ENV_APP_NAME, "svc"),
                (ENV_ENABLED, "TRUE"),
                (ENV_TRANSPORT, "HTTPS"),
            ]),
        );

        assert_eq!(config.credential, "from-env");
        assert_eq!(config.app_name, "svc");
        assert!(config.enabled);
        assert_eq!(config.transport, "HTTPS");
    }

    #[test]
    fn test_bad_bool_ignored() {
        let mut config = ApmConfig::default().with_enabled(true);
        apply_env_overrides(&mut config, lookup_from(&[(ENV_ENABLED, "maybe")]));
        assert!(config.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("request-apm-{}.toml", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[server]\nbind_address = \"127.0.0.1:3000\"\n\n[apm]\napp_name = \"orders\"\ntransport = \"HTTPS\""
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(config.apm.app_name, "orders");
        assert_eq!(config.apm.transport, "HTTPS");
    }

    #[test]
    fn test_load_missing_file() {
        let err = read_config(Path::new("/nonexistent/request-apm.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let path = std::env::temp_dir().join(format!("request-apm-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[apm\ncredential = ").unwrap();
        let err = read_config(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
