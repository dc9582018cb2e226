//! Optional TOML session file.
//!
//! Lets a technician keep the fixed parts of a session (device address,
//! backend, certificate) in a file instead of retyping them:
//!
//! ```toml
//! [session]
//! host = "192.168.4.1"
//! port = 5000
//! web_server_addr = "https://backend.example:8443"
//! client_certificate = "client.pfx"
//! client_certificate_password = "secret"
//! mode = "V3"
//! ```
//!
//! Every key is optional in the file.  [`SessionSettings::overlay`] lets the
//! command line win over the file, and [`SessionSettings::into_config`]
//! checks that the required keys ended up set.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::SessionConfig;

/// Error type for the settings file and for merged settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required setting is missing from both the command line and the file.
    #[error("missing required setting '{0}' (pass it on the command line or in the [session] table)")]
    Missing(&'static str),

    /// `host` is not an IP address.
    #[error("invalid device host '{0}': expected an IP address")]
    InvalidHost(String),
}

/// Top-level layout of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub session: SessionSettings,
}

/// Session keys, all optional until merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub web_server_addr: Option<String>,
    pub client_certificate: Option<PathBuf>,
    pub client_certificate_password: Option<String>,
    /// Protocol version to run without prompting.
    pub mode: Option<String>,
}

impl SettingsFile {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded settings file");
        Self::parse(&text)
    }
}

impl SessionSettings {
    /// Returns `self` with every key that `overrides` sets replaced.
    pub fn overlay(self, overrides: SessionSettings) -> SessionSettings {
        SessionSettings {
            host: overrides.host.or(self.host),
            port: overrides.port.or(self.port),
            web_server_addr: overrides.web_server_addr.or(self.web_server_addr),
            client_certificate: overrides.client_certificate.or(self.client_certificate),
            client_certificate_password: overrides
                .client_certificate_password
                .or(self.client_certificate_password),
            mode: overrides.mode.or(self.mode),
        }
    }

    /// Builds the immutable session configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] when host, port or backend address is unset,
    /// and [`ConfigError::InvalidHost`] when the host is not an IP address.
    pub fn into_config(self) -> Result<SessionConfig, ConfigError> {
        let host = self.host.ok_or(ConfigError::Missing("host"))?;
        let device_ip: IpAddr = host
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidHost(host.clone()))?;
        let device_port = self.port.ok_or(ConfigError::Missing("port"))?;
        let backend = self
            .web_server_addr
            .ok_or(ConfigError::Missing("web_server_addr"))?;

        Ok(SessionConfig {
            device_ip,
            device_port,
            backend,
            client_certificate: self.client_certificate,
            client_certificate_password: self.client_certificate_password,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[session]
host = "192.168.4.1"
port = 5000
web_server_addr = "https://backend.example:8443"
client_certificate = "client.pfx"
client_certificate_password = "secret"
mode = "V3"
"#;

    #[test]
    fn test_parse_full_file() {
        let file = SettingsFile::parse(FULL).unwrap();
        assert_eq!(file.session.host.as_deref(), Some("192.168.4.1"));
        assert_eq!(file.session.port, Some(5000));
        assert_eq!(file.session.mode.as_deref(), Some("V3"));
    }

    #[test]
    fn test_empty_file_is_all_unset() {
        let file = SettingsFile::parse("").unwrap();
        assert_eq!(file, SettingsFile::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = SettingsFile::parse("[session]\nhots = \"1.2.3.4\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_overlay_prefers_command_line() {
        // Arrange
        let file = SettingsFile::parse(FULL).unwrap().session;
        let cli = SessionSettings {
            port: Some(6000),
            ..SessionSettings::default()
        };

        // Act
        let merged = file.overlay(cli);

        // Assert
        assert_eq!(merged.port, Some(6000));
        assert_eq!(merged.host.as_deref(), Some("192.168.4.1"));
    }

    #[test]
    fn test_into_config_builds_session() {
        let config = SettingsFile::parse(FULL)
            .unwrap()
            .session
            .into_config()
            .unwrap();
        assert_eq!(config.device_addr().to_string(), "192.168.4.1:5000");
        assert_eq!(config.backend, "https://backend.example:8443");
        assert!(config.client_certificate().is_some());
    }

    #[test]
    fn test_into_config_reports_missing_backend() {
        let settings = SessionSettings {
            host: Some("10.0.0.1".to_string()),
            port: Some(5000),
            ..SessionSettings::default()
        };
        let err = settings.into_config().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("web_server_addr")));
    }

    #[test]
    fn test_into_config_rejects_hostname() {
        let settings = SessionSettings {
            host: Some("device.local".to_string()),
            port: Some(5000),
            web_server_addr: Some("https://b".to_string()),
            ..SessionSettings::default()
        };
        assert!(matches!(
            settings.into_config(),
            Err(ConfigError::InvalidHost(h)) if h == "device.local"
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = SettingsFile::load(Path::new("/nonexistent/powercfg.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
