//! Server configuration.
//!
//! Resolved once at startup from the environment and then passed into the
//! services that need it; request handlers never read the environment.

use fontpush_remote::{ServiceAccountKey, DEFAULT_CATALOG_URL};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::DEFAULT_MAX_UPLOAD_BYTES;

pub const CREDENTIALS_VAR: &str = "GOOGLE_CREDENTIALS";
pub const ADDR_VAR: &str = "FONTPUSH_ADDR";
pub const UPLOAD_DIR_VAR: &str = "FONTPUSH_UPLOAD_DIR";
pub const MAX_UPLOAD_VAR: &str = "FONTPUSH_MAX_UPLOAD_BYTES";
pub const CATALOG_URL_VAR: &str = "FONT_CATALOG_URL";
pub const FETCH_TIMEOUT_VAR: &str = "FONT_FETCH_TIMEOUT_SECS";

const DEFAULT_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("GOOGLE_CREDENTIALS: {0}")]
    Credentials(#[from] fontpush_remote::RemoteError),
}

/// Configuration resolved at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub catalog_url: String,
    pub fetch_timeout: Option<Duration>,
    pub credentials: ServiceAccountKey,
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which returns the value of
    /// a variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let encoded = get(CREDENTIALS_VAR).ok_or(ConfigError::Missing(CREDENTIALS_VAR))?;
        let credentials = ServiceAccountKey::from_base64(&encoded)?;

        let addr_value = get(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.into());
        let addr = addr_value.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: ADDR_VAR,
                value: addr_value.clone(),
                reason: e.to_string(),
            }
        })?;

        let upload_dir =
            PathBuf::from(get(UPLOAD_DIR_VAR).unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into()));

        let max_upload_bytes = match get(MAX_UPLOAD_VAR) {
            Some(value) => parse_number(MAX_UPLOAD_VAR, &value)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let catalog_url = get(CATALOG_URL_VAR).unwrap_or_else(|| DEFAULT_CATALOG_URL.into());

        let fetch_timeout = match get(FETCH_TIMEOUT_VAR) {
            Some(value) => Some(Duration::from_secs(parse_number(FETCH_TIMEOUT_VAR, &value)?)),
            None => None,
        };

        Ok(Self {
            addr,
            upload_dir,
            max_upload_bytes,
            catalog_url,
            fetch_timeout,
            credentials,
        })
    }
}

fn parse_number<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // base64 of {"client_email":"a@b.c","private_key":"pem"}
    const CREDENTIALS: &str = "eyJjbGllbnRfZW1haWwiOiJhQGIuYyIsInByaXZhdGVfa2V5IjoicGVtIn0=";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[(CREDENTIALS_VAR, CREDENTIALS)])).unwrap();
        assert_eq!(config.addr, "127.0.0.1:5000".parse().unwrap());
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(config.fetch_timeout, None);
        assert_eq!(config.credentials.client_email, "a@b.c");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (CREDENTIALS_VAR, CREDENTIALS),
            (ADDR_VAR, "0.0.0.0:8080"),
            (UPLOAD_DIR_VAR, "/tmp/decks"),
            (MAX_UPLOAD_VAR, "1024"),
            (CATALOG_URL_VAR, "http://localhost:9000/download?family="),
            (FETCH_TIMEOUT_VAR, "30"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/decks"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.catalog_url, "http://localhost:9000/download?family=");
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_missing_credentials() {
        let err = ServerConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(CREDENTIALS_VAR)));
    }

    #[test]
    fn test_invalid_values() {
        let err = ServerConfig::from_lookup(lookup(&[
            (CREDENTIALS_VAR, CREDENTIALS),
            (ADDR_VAR, "not an address"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ADDR_VAR, .. }));

        let err = ServerConfig::from_lookup(lookup(&[
            (CREDENTIALS_VAR, CREDENTIALS),
            (FETCH_TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: FETCH_TIMEOUT_VAR, .. }));
    }
}
