//! Traits through which the workflows reach the device, the backend and the
//! operator.
//!
//! Infrastructure implementations use TCP, HTTPS and stdin/stdout; test
//! implementations record calls.

use async_trait::async_trait;
use powercfg_core::{ConnectApRequest, DelayMessage, DeviceRecord, MqttAuth, MqttAuthRequest};
use thiserror::Error;

use crate::domain::{ClientCertificate, SessionConfig};

/// Device socket failures.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The TCP connection to the device was refused or timed out.
    #[error("failed to connect to device at {addr}: {source}")]
    Connect {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// A send or receive on the established connection failed.
    #[error("device transport error: {0}")]
    Transport(#[from] std::io::Error),
    /// A handshake or push was attempted without an open connection.
    #[error("device is not connected")]
    NotConnected,
    /// A record or command could not be serialized.
    #[error("failed to encode device message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Backend REST failures.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The issuance endpoint failed or replied with something that is not an
    /// issued key.
    #[error("credential issuance failed: {0}")]
    Issuance(String),
    /// A backend record-keeping call failed.
    #[error("backend call to {endpoint} failed: {reason}")]
    Backend { endpoint: String, reason: String },
    /// The client certificate could not be loaded.
    #[error("client certificate {path}: {reason}")]
    Certificate { path: String, reason: String },
}

/// Owns the one TCP connection to the device for a session.
#[async_trait]
pub trait DeviceLink: Send {
    /// Opens the connection and writes a `"<ip>:<port> Connected"` notice.
    async fn initialize(
        &mut self,
        config: &SessionConfig,
        console: &mut dyn Console,
    ) -> Result<(), DeviceError>;

    /// Writes `[DUT<-PC] START\n`.
    async fn send_start_message(&mut self) -> Result<(), DeviceError>;

    /// Writes `hello tcp SUCCESS_CONNECT\n`.
    async fn send_hello_message(&mut self) -> Result<(), DeviceError>;

    /// Reads one chunk, echoes the raw greeting to `console`, and extracts
    /// the MAC from it.
    ///
    /// Returns an empty string when the greeting does not match.
    async fn receive_device_mac(&mut self, console: &mut dyn Console)
        -> Result<String, DeviceError>;

    /// Writes the record as one JSON line; returns the bytes written.
    async fn push_configuration(&mut self, record: &DeviceRecord) -> Result<usize, DeviceError>;

    /// Reads one chunk of status text, verbatim.
    async fn receive_message(&mut self) -> Result<String, DeviceError>;

    async fn send_delay_message(&mut self, message: &DelayMessage) -> Result<(), DeviceError>;

    async fn send_connect_ap_request(&mut self, request: &ConnectApRequest)
        -> Result<(), DeviceError>;

    /// Disconnects and releases the socket.  Idempotent and infallible.
    async fn close(&mut self);
}

/// HTTPS calls to the issuance host and the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Mints an MQTT key for a device/user pair.
    async fn issue_credentials(
        &self,
        config: &SessionConfig,
        request: &MqttAuthRequest,
    ) -> Result<MqttAuth, AuthError>;

    /// Records the issued key with the backend; returns the raw reply.
    async fn record_auth_addition(
        &self,
        config: &SessionConfig,
        user_id: &str,
        mac: &str,
        verify: &str,
        mqtt_key: &str,
    ) -> Result<String, AuthError>;

    /// Pushes the new key for `mac` to the backend; returns the raw reply.
    async fn update_device_key(
        &self,
        config: &SessionConfig,
        mac: &str,
        mqtt_key: &str,
        certificate: Option<ClientCertificate>,
    ) -> Result<String, AuthError>;
}

/// Interactive line source and sink.
#[async_trait]
pub trait Console: Send {
    /// Reads one line without its terminator; `None` at end of input.
    async fn read_line(&mut self) -> std::io::Result<Option<String>>;

    /// Writes `text` with no newline (used for prompts).
    async fn write(&mut self, text: &str) -> std::io::Result<()>;

    async fn write_line(&mut self, text: &str) -> std::io::Result<()>;
}
