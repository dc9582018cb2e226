//! Session configuration types.
//!
//! [`SessionConfig`] is built once at startup and never changes for the rest
//! of the run.  It is a plain struct so tests can construct it directly.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// All settings for one provisioning session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Address of the device on the provisioning network (usually the
    /// device's own access point).
    pub device_ip: IpAddr,

    /// TCP port the device listens on for the provisioning handshake.
    pub device_port: u16,

    /// Base address of the backend, e.g. `https://backend.example:8443`.
    ///
    /// Endpoint paths are appended to it; a trailing `/` is tolerated.
    pub backend: String,

    /// PKCS#12 client certificate for the key-update call.
    pub client_certificate: Option<PathBuf>,

    /// Password of [`SessionConfig::client_certificate`].
    pub client_certificate_password: Option<String>,
}

/// A client certificate together with its password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCertificate {
    pub path: PathBuf,
    pub password: String,
}

impl SessionConfig {
    pub fn new(device_ip: IpAddr, device_port: u16, backend: impl Into<String>) -> Self {
        Self {
            device_ip,
            device_port,
            backend: backend.into(),
            client_certificate: None,
            client_certificate_password: None,
        }
    }

    pub fn device_addr(&self) -> SocketAddr {
        SocketAddr::new(self.device_ip, self.device_port)
    }

    /// Joins `path` onto the backend base address.
    pub fn backend_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.backend.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// The client certificate, only when both the file and the password are
    /// configured.
    pub fn client_certificate(&self) -> Option<ClientCertificate> {
        match (&self.client_certificate, &self.client_certificate_password) {
            (Some(path), Some(password)) => Some(ClientCertificate {
                path: path.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
