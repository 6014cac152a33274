//! Configuration management for the Kapost connector.

use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::verify::Credentials;

const CONFIG_FILE: &str = "config.toml";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// The two secrets have no defaults and must be supplied; everything
/// else works out-of-the-box. Secrets are read exactly once, at
/// startup, and handed to the verifier as an immutable value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    // Secrets
    /// Shared secret keying the request signature HMAC.
    ///
    /// Environment variable: `SIGNATURE_SECRET`
    #[serde(default, alias = "SIGNATURE_SECRET")]
    pub signature_secret: String,
    /// Bearer API key the caller must present.
    ///
    /// Environment variable: `API_KEY`
    #[serde(default, alias = "API_KEY")]
    pub api_key: String,

    // Logging
    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment
    /// variable overrides.
    ///
    /// # Errors
    ///
    /// Fails if extraction fails or validation rejects the result
    /// (missing secrets, zero port or timeout).
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Extracts the immutable credential pair the verifier runs with.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.signature_secret, &self.api_key)
    }

    /// Request timeout as a `Duration`.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.signature_secret.is_empty() {
            anyhow::bail!("SIGNATURE_SECRET must be set");
        }

        if self.api_key.is_empty() {
            anyhow::bail!("API_KEY must be set");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            signature_secret: String::new(),
            api_key: String::new(),
            rust_log: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, env, sync::Mutex};

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct TestEnvGuard {
        _lock: std::sync::MutexGuard<'static, ()>,
        vars: Vec<String>,
        originals: HashMap<String, Option<String>>,
    }

    impl TestEnvGuard {
        fn new() -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Self { _lock: lock, vars: Vec::new(), originals: HashMap::new() }
        }

        fn set_var(&mut self, key: &str, value: &str) {
            if !self.vars.contains(&key.to_string()) {
                self.originals.insert(key.to_string(), env::var(key).ok());
                self.vars.push(key.to_string());
            }
            env::set_var(key, value);
        }
    }

    impl Drop for TestEnvGuard {
        fn drop(&mut self) {
            for var in &self.vars {
                match self.originals.get(var) {
                    Some(Some(value)) => env::set_var(var, value),
                    Some(None) => env::remove_var(var),
                    None => {},
                }
            }
        }
    }

    #[test]
    fn defaults_alone_fail_validation_without_secrets() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_with_secrets_validates() {
        let mut config = Config::default();
        config.signature_secret = "secret".to_string();
        config.api_key = "key".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_are_applied() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("HOST", "0.0.0.0");
        guard.set_var("PORT", "9090");
        guard.set_var("REQUEST_TIMEOUT", "15");
        guard.set_var("SIGNATURE_SECRET", "env-secret");
        guard.set_var("API_KEY", "env-key");

        let config = Config::load().expect("Config should load with env overrides");

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9090);
        assert_eq!(config.request_timeout, 15);
        assert_eq!(config.signature_secret, "env-secret");
        assert_eq!(config.api_key, "env-key");
    }

    #[test]
    fn load_fails_without_secrets() {
        let mut guard = TestEnvGuard::new();
        guard.set_var("SIGNATURE_SECRET", "");
        guard.set_var("API_KEY", "");

        assert!(Config::load().is_err());
    }

    #[test]
    fn invalid_values_fail_validation() {
        let mut config = Config::default();
        config.signature_secret = "secret".to_string();
        config.api_key = "key".to_string();

        config.port = 0;
        assert!(config.validate().is_err());

        config.port = 8080;
        config.request_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn socket_address_parsing() {
        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 9000;

        let addr = config.parse_server_addr().expect("Should parse socket address");

        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 9000);
    }

    #[test]
    fn credentials_carry_both_secrets() {
        let mut config = Config::default();
        config.signature_secret = "sig".to_string();
        config.api_key = "key".to_string();

        let credentials = config.credentials();
        assert_eq!(credentials.signature_secret(), "sig");
        assert_eq!(credentials.api_key(), "key");
    }
}
