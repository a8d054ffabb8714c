//! Runtime settings loaded from environment variables.
//!
//! Every setting has a default so a local instance starts with an empty environment.
//! A `.env` file is loaded by `main` before this runs.

use crate::errors::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDRESS: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);
const DEFAULT_DATABASE_URL: &str = "sqlite://delivery_hub.sqlite?mode=rwc";
const DEFAULT_CATALOG_PATH: &str = "config.toml";

/// Application settings shared by the server and the database layer
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Socket address the HTTP server listens on (`BIND_ADDRESS`)
    pub bind_address: SocketAddr,
    /// Database connection string (`DATABASE_URL`)
    pub database_url: String,
    /// Upper bound of pooled connections (`DB_MAX_CONNECTIONS`)
    pub db_max_connections: u32,
    /// Connection attempts before giving up at startup (`DB_CONNECT_RETRIES`)
    pub db_connect_retries: u32,
    /// Pause between connection attempts (`DB_RETRY_DELAY_MS`)
    pub db_retry_delay: Duration,
    /// Key installed when the key table is empty (`BOOTSTRAP_API_KEY`)
    pub bootstrap_api_key: Option<String>,
    /// Gas product catalog used for seeding (`CATALOG_PATH`)
    pub catalog_path: PathBuf,
}

impl AppConfig {
    /// Loads settings from the process environment.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads settings through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address: SocketAddr =
            parse_or(&get, "BIND_ADDRESS", SocketAddr::from(DEFAULT_BIND_ADDRESS))?;
        let db_max_connections: u32 = parse_or(&get, "DB_MAX_CONNECTIONS", 10)?;
        let db_connect_retries: u32 = parse_or(&get, "DB_CONNECT_RETRIES", 5)?;
        let retry_delay_ms: u64 = parse_or(&get, "DB_RETRY_DELAY_MS", 1000)?;

        if db_max_connections == 0 {
            return Err(Error::Config {
                message: "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            });
        }
        if db_connect_retries == 0 {
            return Err(Error::Config {
                message: "DB_CONNECT_RETRIES must be at least 1".to_string(),
            });
        }

        Ok(Self {
            bind_address,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            db_max_connections,
            db_connect_retries,
            db_retry_delay: Duration::from_millis(retry_delay_ms),
            bootstrap_api_key: get("BOOTSTRAP_API_KEY"),
            catalog_path: get("CATALOG_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH), PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e: T::Err| Error::Config {
            message: format!("Invalid value for {key} ({raw}): {e}"),
        })
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address.port(), 8000);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_connect_retries, 5);
        assert_eq!(config.db_retry_delay, Duration::from_millis(1000));
        assert!(config.bootstrap_api_key.is_none());
        assert_eq!(config.catalog_path, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_values_from_lookup() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("DATABASE_URL", "postgres://localhost/gas"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("DB_RETRY_DELAY_MS", "250"),
            ("BOOTSTRAP_API_KEY", "dh_secret"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:9000");
        assert_eq!(config.database_url, "postgres://localhost/gas");
        assert_eq!(config.db_max_connections, 20);
        assert_eq!(config.db_retry_delay, Duration::from_millis(250));
        assert_eq!(config.bootstrap_api_key.as_deref(), Some("dh_secret"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "  ")])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let result = AppConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "many")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let result = AppConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "0")]));
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
