//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults. The binary loads an optional `.env` file first.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tally_core::render::{validate_line_width, DEFAULT_MERCHANT_NAME, DEFAULT_THANK_YOU};
use tally_core::{RenderConfig, DEFAULT_LINE_WIDTH};
use tally_db::DbConfig;

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file (`:memory:` for a throwaway database)
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Header line of rendered receipts
    pub merchant_name: String,

    /// Closing line of rendered receipts
    pub receipt_footer: String,

    /// Render width used when a caller does not pass one
    pub line_width: usize,

    /// Offset from UTC for printed timestamps, in minutes
    pub utc_offset_minutes: i32,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = ServiceConfig {
            database_path: lookup("TALLY_DATABASE_PATH")
                .unwrap_or_else(|| "./tally.db".to_string())
                .into(),

            db_max_connections: parse_var(&lookup, "TALLY_DB_MAX_CONNECTIONS", 5)?,

            merchant_name: lookup("TALLY_MERCHANT_NAME")
                .unwrap_or_else(|| DEFAULT_MERCHANT_NAME.to_string()),

            receipt_footer: lookup("TALLY_RECEIPT_FOOTER")
                .unwrap_or_else(|| DEFAULT_THANK_YOU.to_string()),

            line_width: parse_var(&lookup, "TALLY_LINE_WIDTH", DEFAULT_LINE_WIDTH)?,

            utc_offset_minutes: parse_var(&lookup, "TALLY_UTC_OFFSET_MINUTES", 0)?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "TALLY_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        validate_line_width(config.line_width)
            .map_err(|_| ConfigError::InvalidValue("TALLY_LINE_WIDTH".to_string()))?;
        config.utc_offset()?;

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.db_max_connections)
    }

    /// Renderer settings derived from this configuration.
    pub fn render_config(&self) -> Result<RenderConfig, ConfigError> {
        Ok(RenderConfig {
            merchant_name: self.merchant_name.clone(),
            thank_you: self.receipt_footer.clone(),
            utc_offset: self.utc_offset()?,
        })
    }

    fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ConfigError::InvalidValue("TALLY_UTC_OFFSET_MINUTES".to_string()))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
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

    fn load_with(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./tally.db"));
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.merchant_name, "FOP Johnsoniuk Borys");
        assert_eq!(config.receipt_footer, "Thank you for your purchase!");
        assert_eq!(config.line_width, 32);
        assert_eq!(config.render_config().unwrap(), RenderConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = load_with(&[
            ("TALLY_DATABASE_PATH", ":memory:"),
            ("TALLY_LINE_WIDTH", "48"),
            ("TALLY_UTC_OFFSET_MINUTES", "120"),
            ("TALLY_MERCHANT_NAME", "Corner Shop"),
        ])
        .unwrap();

        assert!(config.db_config().is_in_memory());
        assert_eq!(config.line_width, 48);
        let render = config.render_config().unwrap();
        assert_eq!(render.merchant_name, "Corner Shop");
        assert_eq!(render.utc_offset.local_minus_utc(), 7200);
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("TALLY_LINE_WIDTH", "10"),
            ("TALLY_LINE_WIDTH", "wide"),
            ("TALLY_DB_MAX_CONNECTIONS", "0"),
            ("TALLY_UTC_OFFSET_MINUTES", "100000"),
        ] {
            match load_with(&[(key, value)]) {
                Err(ConfigError::InvalidValue(name)) => assert_eq!(name, key),
                other => panic!("{}={} gave {:?}", key, value, other),
            }
        }
    }
}
