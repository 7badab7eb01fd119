use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::probe::DomainTarget;
use super::server::ServerConfig;
use super::upstream::DnsServerConfig;
use crate::Protocol;

pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 30;

const SEARCH_PATHS: [&str; 2] = ["dnspulse.toml", "/etc/dnspulse/config.toml"];

/// Main configuration structure for the exporter
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Scrape endpoint listen address and port
    #[serde(flatten)]
    pub server: ServerConfig,

    /// Log every probe outcome at info level
    #[serde(default)]
    pub verbose_logging: bool,

    /// Per-query timeout in milliseconds; 0 selects the default
    #[serde(default)]
    pub timeout: u64,

    /// Seconds to wait between probe cycles; 0 selects the default
    #[serde(default)]
    pub probe_interval: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub domains: Vec<DomainTarget>,

    #[serde(default)]
    pub dns_servers: Vec<DnsServerConfig>,
}

impl Config {
    /// Load configuration from file
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. dnspulse.toml in current directory
    /// 3. /etc/dnspulse/config.toml
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::get_config_path() {
                Some(found) => Self::from_file(&found)?,
                None => return Err(ConfigError::NotFound(SEARCH_PATHS.join(", "))),
            },
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
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
        if let Some(address) = overrides.listen_address {
            self.server.listen_address = address;
        }
        if let Some(port) = overrides.listen_port {
            self.server.listen_port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if overrides.verbose {
            self.verbose_logging = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.listen_port == 0 {
            return Err(ConfigError::Validation("Listen port cannot be 0".to_string()));
        }

        if self.domains.is_empty() {
            return Err(ConfigError::Validation("No domains configured".to_string()));
        }

        if self.dns_servers.is_empty() {
            return Err(ConfigError::Validation(
                "No DNS servers configured".to_string(),
            ));
        }

        for domain in &self.domains {
            if domain.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "Domain name cannot be empty".to_string(),
                ));
            }
        }

        for server in &self.dns_servers {
            if server.address.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "DNS server address cannot be empty".to_string(),
                ));
            }
            if server.port == Some(0) {
                return Err(ConfigError::Validation(format!(
                    "Port 0 is not valid for server {}",
                    server.address
                )));
            }
            if let Some(tag) = &server.protocol {
                tag.parse::<Protocol>().map_err(|_| {
                    ConfigError::Validation(format!(
                        "Invalid protocol '{}' for server {}",
                        tag, server.address
                    ))
                })?;
            }
        }

        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        match self.timeout {
            0 => Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            ms => Duration::from_millis(ms),
        }
    }

    pub fn probe_interval(&self) -> Duration {
        match self.probe_interval {
            0 => Duration::from_secs(DEFAULT_PROBE_INTERVAL_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        SEARCH_PATHS
            .iter()
            .find(|candidate| Path::new(candidate).exists())
            .map(|found| found.to_string())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub listen_address: Option<String>,
    pub listen_port: Option<u16>,
    pub log_level: Option<String>,
    pub verbose: bool,
}
