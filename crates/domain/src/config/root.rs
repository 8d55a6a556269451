use serde::{Deserialize, Serialize};
use std::path::Path;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::{ResolverConfig, ResolverStrategy};

const LOCAL_CONFIG: &str = "tern.toml";
const SYSTEM_CONFIG: &str = "/etc/tern/config.toml";

/// Main configuration structure for Tern
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. tern.toml in current directory
    /// 3. /etc/tern/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if Path::new(LOCAL_CONFIG).exists() {
            Self::from_file(LOCAL_CONFIG)?
        } else if Path::new(SYSTEM_CONFIG).exists() {
            Self::from_file(SYSTEM_CONFIG)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if !overrides.nameservers.is_empty() {
            self.resolver.nameservers = overrides.nameservers;
        }
        if let Some(strategy) = overrides.strategy {
            self.resolver.strategy = strategy;
        }
        if let Some(timeout) = overrides.timeout_ms {
            self.resolver.timeout_ms = timeout;
        }
        if let Some(retries) = overrides.retries {
            self.resolver.retries = retries;
        }
        if overrides.no_cache {
            self.resolver.cache_enabled = false;
        }
        if let Some(hosts) = overrides.hosts_file {
            self.resolver.hosts_file = Some(hosts);
        }
        if overrides.insecure {
            self.resolver.tls.verify = false;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if overrides.json_logs {
            self.logging.json = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.nameservers.is_empty() {
            return Err(ConfigError::Validation(
                "No name servers configured".to_string(),
            ));
        }

        if let Err(e) = self.resolver.parsed_nameservers() {
            return Err(ConfigError::Validation(e.to_string()));
        }

        if self.resolver.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.resolver.cache_enabled && self.resolver.cache_max_entries == 0 {
            return Err(ConfigError::Validation(
                "cache_max_entries must be greater than 0 when the cache is enabled".to_string(),
            ));
        }

        if let Some(fingerprint) = &self.resolver.tls.fingerprint {
            let hex: String = fingerprint.chars().filter(|c| *c != ':').collect();
            if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Validation(format!(
                    "TLS fingerprint '{}' is not a hex SHA-256 digest",
                    fingerprint
                )));
            }
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub nameservers: Vec<String>,
    pub strategy: Option<ResolverStrategy>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
    pub no_cache: bool,
    pub hosts_file: Option<String>,
    pub insecure: bool,
    pub log_level: Option<String>,
    pub json_logs: bool,
}
