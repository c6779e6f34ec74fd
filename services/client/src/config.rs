//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub google_client_id: String,
    pub signin_bind_address: SocketAddr,
    pub session_file: PathBuf,
    pub download_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // --- Remote API ---
        let api_base = var("API_BASE").unwrap_or_else(|| "http://127.0.0.1:8000".to_string());
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "API_BASE".to_string(),
                format!("'{}' must start with http:// or https://", api_base),
            ));
        }
        let api_base = api_base.trim_end_matches('/').to_string();

        let google_client_id = var("GOOGLE_CLIENT_ID")
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("GOOGLE_CLIENT_ID".to_string()))?;

        // --- Loopback sign-in page ---
        let bind_str = var("SIGNIN_BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1:5173".to_string());
        let signin_bind_address = bind_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("SIGNIN_BIND_ADDRESS".to_string(), e.to_string())
        })?;

        // --- Local files ---
        let session_file = var("SESSION_FILE").map(PathBuf::from).unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("paper-desk")
                .join("session.json")
        });
        let download_dir = var("DOWNLOAD_DIR")
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base,
            google_client_id,
            signin_bind_address,
            session_file,
            download_dir,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_client_id_is_set() {
        let config = Config::from_lookup(lookup(&[("GOOGLE_CLIENT_ID", "id.apps")])).unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:8000");
        assert_eq!(config.signin_bind_address.port(), 5173);
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.session_file.ends_with("paper-desk/session.json"));
    }

    #[test]
    fn client_id_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "GOOGLE_CLIENT_ID"));
    }

    #[test]
    fn api_base_must_be_http() {
        let err = Config::from_lookup(lookup(&[
            ("GOOGLE_CLIENT_ID", "id.apps"),
            ("API_BASE", "ftp://example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "API_BASE"));
    }

    #[test]
    fn trailing_slash_is_dropped_and_paths_are_overridable() {
        let config = Config::from_lookup(lookup(&[
            ("GOOGLE_CLIENT_ID", "id.apps"),
            ("API_BASE", "https://api.example.com/"),
            ("SESSION_FILE", "/tmp/s.json"),
            ("DOWNLOAD_DIR", "/tmp/out"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.api_base, "https://api.example.com");
        assert_eq!(config.session_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.log_level, Level::DEBUG);
    }
}
