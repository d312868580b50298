//! TOML-based configuration.
//!
//! Supports a config file (crm-query.toml) with environment variable
//! expansion in the store path.
//!
//! Example configuration:
//! ```toml
//! dialect = "mysql"
//!
//! [pagination]
//! default_limit = 25
//! max_limit = 500
//!
//! [filters]
//! enum_parse_mode = "strict"
//!
//! [store]
//! path = "${CRM_QUERY_DB}"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::page::{PageLimits, MAX_LIMIT};
use crate::params::EnumParseMode;
use crate::sql::Dialect;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CRM_QUERY_CONFIG";

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "crm-query.toml";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// SQL dialect to generate.
    pub dialect: Dialect,

    /// Page size bounds.
    pub pagination: PageLimits,

    /// Filter parsing behaviour.
    pub filters: FilterSettings,

    /// Record store used by `search` commands.
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// How flat query parameters treat unrecognised enum values.
    pub enum_parse_mode: EnumParseMode,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite database file (supports ${ENV_VAR} expansion). In-memory when unset.
    pub path: Option<String>,
}

impl StoreSettings {
    /// The database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CRM_QUERY_CONFIG`
    /// 2. `./crm-query.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }

    /// Check page bounds.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let PageLimits {
            default_limit,
            max_limit,
        } = self.pagination;
        if max_limit < 1 || max_limit > MAX_LIMIT {
            return Err(SettingsError::InvalidConfig(format!(
                "pagination.max_limit must be between 1 and {}, got {}",
                MAX_LIMIT, max_limit
            )));
        }
        if default_limit < 1 || default_limit > max_limit {
            return Err(SettingsError::InvalidConfig(format!(
                "pagination.default_limit must be between 1 and {}, got {}",
                max_limit, default_limit
            )));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            let name = chars.by_ref().take_while(|&ch| ch != '}').collect();
            name
        } else {
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                name.push(ch);
                chars.next();
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
