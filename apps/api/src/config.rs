use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub ollama_host: String,
    pub ollama_model: String,
    pub llm_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key)
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            ollama_host: or_default("OLLAMA_HOST", DEFAULT_OLLAMA_HOST),
            ollama_model: or_default("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
            llm_timeout: Duration::from_secs(
                or_default("LLM_TIMEOUT_SECS", "120")
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            port: or_default("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/ats")]))
            .unwrap();
        assert_eq!(config.ollama_host, DEFAULT_OLLAMA_HOST);
        assert_eq!(config.ollama_model, "llama3");
        assert_eq!(config.llm_timeout, Duration::from_secs(120));
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/ats"),
            ("OLLAMA_HOST", "http://gpu-box:11434"),
            ("OLLAMA_MODEL", "mistral"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.ollama_host, "http://gpu-box:11434");
        assert_eq!(config.ollama_model, "mistral");
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_missing_database_url_fails() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_port_fails() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/ats"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
