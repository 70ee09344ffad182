//! Configuration module
//!
//! Reads the service configuration from a TOML file
//! (`~/.config/fleet-booking/config.toml` by default). Every section and
//! field has a default, so a partial file or no file at all is valid.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! shutdown_timeout = 30
//!
//! [database]
//! url = "sqlite://./fleet-booking.db?mode=rwc"
//!
//! [logging]
//! level = "info"
//! json = false
//!
//! [pricing]
//! tax_rate = "0.10"
//! fee_rate = "0.05"
//! ```

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::booking::PricingPolicy;
use crate::infrastructure::DatabaseConfig;
use crate::shared::errors::InfraError;

/// Environment variable overriding the config file location
pub const CONFIG_ENV_VAR: &str = "BOOKING_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub pricing: PricingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            url: defaults.url,
            max_connections: defaults.max_connections,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. "info" or "fleet_booking=debug"
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub tax_rate: Decimal,
    pub fee_rate: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let policy = PricingPolicy::default();
        Self {
            tax_rate: policy.tax_rate,
            fee_rate: policy.fee_rate,
        }
    }
}

impl From<&PricingConfig> for PricingPolicy {
    fn from(cfg: &PricingConfig) -> Self {
        Self {
            tax_rate: cfg.tax_rate,
            fee_rate: cfg.fee_rate,
        }
    }
}

impl From<&DatabaseSection> for DatabaseConfig {
    fn from(cfg: &DatabaseSection) -> Self {
        Self {
            url: cfg.url.clone(),
            max_connections: cfg.max_connections,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            InfraError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        let cfg: Self = toml::from_str(raw)
            .map_err(|e| InfraError::Config(format!("Invalid config: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), InfraError> {
        if self.server.port == 0 {
            return Err(InfraError::Config("server.port must not be 0".to_string()));
        }
        if self.database.url.trim().is_empty() {
            return Err(InfraError::Config("database.url must be set".to_string()));
        }
        PricingPolicy::from(&self.pricing)
            .validate()
            .map_err(|e| InfraError::Config(e.to_string()))
    }

    /// Write the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), InfraError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InfraError::Config(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| InfraError::Config(format!("Cannot serialize config: {}", e)))?;
        std::fs::write(path, raw)
            .map_err(|e| InfraError::Config(format!("Cannot write {}: {}", path.display(), e)))
    }
}

/// `$BOOKING_CONFIG` if set, otherwise `~/.config/fleet-booking/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fleet-booking")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [pricing]
            tax_rate = "0.20"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.logging.level, "info");
        let policy = PricingPolicy::from(&cfg.pricing);
        assert_eq!(policy.tax_rate, Decimal::new(20, 2));
        assert_eq!(policy.fee_rate, Decimal::new(5, 2));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(AppConfig::from_toml("[server]\nport = 0").is_err());
        assert!(AppConfig::from_toml("[pricing]\nfee_rate = \"-0.5\"").is_err());
        assert!(AppConfig::from_toml("server = 3").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join(format!("fleet-booking-{}.toml", uuid::Uuid::new_v4()));
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("fleet-booking-{}", uuid::Uuid::new_v4()))
            .join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.logging.json = true;
        cfg.save(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), cfg);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
