//! Server configuration.
//!
//! # Responsibility
//! - Load TOML configuration with per-field defaults.
//! - Validate values that end up in socket addresses and header names.
//!
//! # Invariants
//! - Every key is optional; an empty file equals `ServerConfig::default()`.
//! - Unknown keys are rejected so typos do not silently fall back to defaults.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind, e.g. `127.0.0.1` or `0.0.0.0`.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite database file; created on first start.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Prefix of the `X-<name>-alert` / `X-<name>-error` response headers.
    #[serde(default = "default_application_name")]
    pub application_name: String,
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; stderr when absent.
    #[serde(default)]
    pub log_dir: Option<String>,
    /// Allow any origin, method and header.
    #[serde(default)]
    pub cors_permissive: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> PathBuf {
    PathBuf::from("conferences.sqlite3")
}

fn default_application_name() -> String {
    "conferenceApp".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            database_path: default_database_path(),
            application_name: default_application_name(),
            log_level: None,
            log_dir: None,
            cors_permissive: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl ServerConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints not expressible in serde attributes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;

        let name = self.application_name.as_str();
        if name.is_empty() {
            return Err(ConfigError::Invalid(
                "application_name cannot be empty".to_string(),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ConfigError::Invalid(format!(
                "application_name `{name}` must only contain ASCII letters, digits, `-`, `_` or `.`"
            )));
        }

        if let Some(dir) = &self.log_dir {
            if !Path::new(dir).is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{dir}`"
                )));
            }
        }
        Ok(())
    }

    /// Resolves `bind_address:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.bind_address.parse::<IpAddr>().map_err(|err| {
            ConfigError::Invalid(format!(
                "bind_address `{}` is not an IP address: {err}",
                self.bind_address
            ))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig};
    use std::path::PathBuf;

    #[test]
    fn empty_file_yields_defaults() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            bind_address = "0.0.0.0"
            port = 9000
            database_path = "/var/lib/conferences/db.sqlite3"
            application_name = "testms"
            log_level = "warn"
            cors_permissive = true
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(
            config.database_path,
            PathBuf::from("/var/lib/conferences/db.sqlite3")
        );
        assert_eq!(config.application_name, "testms");
        assert_eq!(config.log_level.as_deref(), Some("warn"));
        assert_eq!(config.log_dir, None);
        assert!(config.cors_permissive);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ServerConfig::from_toml_str("prot = 80").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_bind = ServerConfig::from_toml_str(r#"bind_address = "localhost""#);
        assert!(matches!(bad_bind, Err(ConfigError::Invalid(_))));

        let bad_name = ServerConfig::from_toml_str(r#"application_name = "my app""#);
        assert!(matches!(bad_name, Err(ConfigError::Invalid(_))));

        let bad_log_dir = ServerConfig::from_toml_str(r#"log_dir = "logs""#);
        assert!(matches!(bad_log_dir, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
