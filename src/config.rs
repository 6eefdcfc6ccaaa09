use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_monitored_ips")]
    pub monitored_ips: Vec<String>,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_api_port() -> u16 { 3000 }
fn default_probe_timeout_ms() -> u64 { 1000 }
fn default_chat_model() -> String { "gpt-4o".into() }
fn default_static_dir() -> String { "public".into() }

fn default_monitored_ips() -> Vec<String> {
    vec!["8.8.8.8".into(), "1.1.1.1".into()]
}

/// Credentials for the external services, read from the environment once at
/// startup and handed to the client constructors. Leaf code never touches
/// the environment itself.
#[derive(Clone)]
pub struct Secrets {
    pub ipinfo_token: String,
    pub openai_api_key: String,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            ipinfo_token: var_or_warn("IPINFO_TOKEN"),
            openai_api_key: var_or_warn("OPENAI_API_KEY"),
        }
    }
}

fn var_or_warn(name: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => value,
        _ => {
            warn!("{} is not set; requests that need it will fail", name);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_falls_back_to_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.api_port, 3000);
        assert_eq!(config.monitored_ips, vec!["8.8.8.8", "1.1.1.1"]);
        assert_eq!(config.probe_timeout_ms, 1000);
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.static_dir, "public");
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "api_port": 8080, "monitored_ips": ["9.9.9.9"], "probe_timeout_ms": 250 }"#,
        )
        .unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.monitored_ips, vec!["9.9.9.9"]);
        assert_eq!(config.probe_timeout_ms, 250);
        assert_eq!(config.chat_model, "gpt-4o");
    }
}
