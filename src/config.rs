// ABOUTME: Connection settings for the SQL Server instance bindings are managed on
// ABOUTME: Handles defaults, JSON persistence, and the default config file location

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// Settings for the administrative connection used to provision bindings.
///
/// The `database` field is the default target database; individual operations
/// can be redirected with [`crate::Binder::with_database`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_true")]
    pub trust_certificate: bool,
}

fn default_port() -> u16 {
    1433
}

fn default_true() -> bool {
    true
}

fn default_database() -> String {
    "master".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1433,
            username: "sa".to_string(),
            password: String::new(),
            database: "master".to_string(),
            trust_certificate: true,
        }
    }
}

impl ServerSettings {
    /// Get the default config file path based on OS
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoDirFound)?;
        let app_dir = config_dir.join("mssql-binder");
        Ok(app_dir.join("config.json"))
    }

    /// Load settings from the default location, or create defaults if not exists
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            let settings = Self::default();
            settings.save()?;
            return Ok(settings);
        }

        Self::load_from(&path)
    }

    /// Load settings from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings: ServerSettings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save settings to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ServerSettings::default();
        assert_eq!(settings.port, 1433);
        assert_eq!(settings.database, "master");
        assert!(settings.trust_certificate);
    }

    #[test]
    fn test_serialization() {
        let settings = ServerSettings::default();
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let parsed: ServerSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.host, settings.host);
        assert_eq!(parsed.database, settings.database);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let parsed: ServerSettings =
            serde_json::from_str(r#"{"host": "db.internal", "username": "provisioner"}"#).unwrap();
        assert_eq!(parsed.host, "db.internal");
        assert_eq!(parsed.port, 1433);
        assert_eq!(parsed.database, "master");
        assert_eq!(parsed.password, "");
    }

    #[test]
    fn test_save_and_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut settings = ServerSettings::default();
        settings.host = "sql.example.test".to_string();
        settings.database = "tenants".to_string();
        settings.save_to(&path).unwrap();

        let loaded = ServerSettings::load_from(&path).unwrap();
        assert_eq!(loaded.host, "sql.example.test");
        assert_eq!(loaded.database, "tenants");
    }
}
