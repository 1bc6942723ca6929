//! Reconciliation configuration.
//!
//! Configuration is loaded from environment variables (after reading a
//! `.env` file if present) with fallback to defaults.

use std::env;

use grn_core::validation::validate_uid_part;
use grn_core::ValidationError;
use serde::{Deserialize, Serialize};

use crate::pool::DbConfig;

/// Codes and location stamped on generated UIDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidSettings {
    /// Tenant code, e.g. `SAIF`.
    pub tenant_code: String,

    /// Plant code, e.g. `KOL`.
    pub plant_code: String,

    /// Location recorded on the `RECEIVED` lifecycle event.
    pub location: String,
}

impl UidSettings {
    /// Builds settings after validating both codes.
    pub fn new(
        tenant_code: impl Into<String>,
        plant_code: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let settings = UidSettings {
            tenant_code: tenant_code.into(),
            plant_code: plant_code.into(),
            location: location.into(),
        };
        validate_uid_part("tenant_code", &settings.tenant_code)?;
        validate_uid_part("plant_code", &settings.plant_code)?;
        Ok(settings)
    }
}

impl Default for UidSettings {
    fn default() -> Self {
        UidSettings {
            tenant_code: "SAIF".to_string(),
            plant_code: "KOL".to_string(),
            location: "Warehouse".to_string(),
        }
    }
}

/// Reconciliation tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconConfig {
    /// SQLite connection string
    pub database_url: String,

    /// Pool size
    pub max_connections: u32,

    /// UID generation settings
    pub uid: UidSettings,
}

impl ReconConfig {
    /// Load configuration from `.env` and environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://grn_dev.db?mode=rwc".to_string());

        let max_connections = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?;

        let defaults = UidSettings::default();
        let tenant_code = lookup("UID_TENANT_CODE").unwrap_or(defaults.tenant_code);
        let plant_code = lookup("UID_PLANT_CODE").unwrap_or(defaults.plant_code);
        let location = lookup("UID_LOCATION").unwrap_or(defaults.location);

        validate_uid_part("tenant_code", &tenant_code)
            .map_err(|_| ConfigError::InvalidValue("UID_TENANT_CODE".to_string()))?;
        validate_uid_part("plant_code", &plant_code)
            .map_err(|_| ConfigError::InvalidValue("UID_PLANT_CODE".to_string()))?;
        if location.trim().is_empty() {
            return Err(ConfigError::InvalidValue("UID_LOCATION".to_string()));
        }

        Ok(ReconConfig {
            database_url,
            max_connections,
            uid: UidSettings {
                tenant_code,
                plant_code,
                location,
            },
        })
    }

    /// Pool configuration for [`crate::Database::connect`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_url.clone()).max_connections(self.max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReconConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, "sqlite://grn_dev.db?mode=rwc");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.uid, UidSettings::default());
    }

    #[test]
    fn test_overrides() {
        let config = ReconConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite://./other.db"),
            ("DB_MAX_CONNECTIONS", "2"),
            ("UID_TENANT_CODE", "ACME"),
            ("UID_PLANT_CODE", "PUN"),
            ("UID_LOCATION", "Dock 4"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite://./other.db");
        assert_eq!(config.db_config().max_connections, 2);
        assert_eq!(config.uid.tenant_code, "ACME");
        assert_eq!(config.uid.plant_code, "PUN");
        assert_eq!(config.uid.location, "Dock 4");
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let cases = [
            ("DB_MAX_CONNECTIONS", "many"),
            ("DB_MAX_CONNECTIONS", "0"),
            ("UID_TENANT_CODE", "saif"),
            ("UID_PLANT_CODE", "K-1"),
            ("UID_LOCATION", "  "),
        ];
        for (key, value) in cases {
            let err = ReconConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid value for {key}"));
        }
    }

    #[test]
    fn test_uid_settings_validation() {
        assert!(UidSettings::new("SAIF", "KOL", "Warehouse").is_ok());
        assert!(UidSettings::new("", "KOL", "Warehouse").is_err());
        assert!(UidSettings::new("SAIF", "TOOLONGCODE", "Warehouse").is_err());
    }
}
