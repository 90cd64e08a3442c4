use serde::{Deserialize, Serialize};
use std::path::Path;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::{ResolverConfig, ResolverSelector};
use super::trace::TraceConfig;

const LOCAL_CONFIG: &str = "dnseye.toml";
const SYSTEM_CONFIG: &str = "/etc/dnseye/config.toml";

/// Main configuration structure for DNS By Eye
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Timeouts, concurrency limits and root hints for the descent
    #[serde(default)]
    pub trace: TraceConfig,

    /// Resolver used for nameserver address lookups
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
    /// 2. dnseye.toml in current directory
    /// 3. /etc/dnseye/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path.map(str::to_string).or_else(Self::get_config_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(server) = overrides.resolver {
            self.resolver.default_server = server;
        }
        if let Some(timeout) = overrides.query_timeout_ms {
            self.trace.query_timeout_ms = timeout;
        }
        if overrides.use_ipv6 {
            self.trace.use_ipv6 = true;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let trace = &self.trace;

        if trace.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "trace.query_timeout_ms cannot be 0".to_string(),
            ));
        }

        if trace.layer_lifetime_ms < trace.query_timeout_ms {
            return Err(ConfigError::Validation(format!(
                "trace.layer_lifetime_ms ({}) must be at least trace.query_timeout_ms ({})",
                trace.layer_lifetime_ms, trace.query_timeout_ms
            )));
        }

        if trace.request_timeout_ms < trace.layer_lifetime_ms {
            return Err(ConfigError::Validation(format!(
                "trace.request_timeout_ms ({}) must be at least trace.layer_lifetime_ms ({})",
                trace.request_timeout_ms, trace.layer_lifetime_ms
            )));
        }

        if trace.max_concurrent_queries == 0 || trace.max_concurrent_traces == 0 {
            return Err(ConfigError::Validation(
                "Concurrency limits must be greater than 0".to_string(),
            ));
        }

        if trace.max_compare_subjects < 2 {
            return Err(ConfigError::Validation(
                "trace.max_compare_subjects must allow at least 2 subjects".to_string(),
            ));
        }

        if trace.root_hints.is_empty() {
            return Err(ConfigError::Validation("No root hints configured".to_string()));
        }

        for hint in &trace.root_hints {
            let usable = hint.ipv4.is_some() || (trace.use_ipv6 && hint.ipv6.is_some());
            if !usable {
                return Err(ConfigError::Validation(format!(
                    "Root hint '{}' has no usable address",
                    hint.hostname
                )));
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = self.to_toml()?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Path of the configuration file that `load(None, ..)` would read
    pub fn get_config_path() -> Option<String> {
        [LOCAL_CONFIG, SYSTEM_CONFIG]
            .into_iter()
            .find(|p| Path::new(p).exists())
            .map(str::to_string)
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub log_level: Option<String>,
    pub resolver: Option<ResolverSelector>,
    pub query_timeout_ms: Option<u64>,
    pub use_ipv6: bool,
}
