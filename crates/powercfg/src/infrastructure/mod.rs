//! Infrastructure layer for powercfg.
//!
//! # Sub-modules
//!
//! - **`device`** – TCP link to the device: control lines, greeting parsing,
//!   JSON-line record push and raw status reads.
//!
//! - **`auth`** – HTTPS calls to the issuance host and the backend, with TLS
//!   version pinning and the optional PKCS#12 client certificate.
//!
//! - **`console`** – Line-based prompt I/O over stdin/stdout.
//!
//! - **`settings`** – Optional TOML session file and its merge with the
//!   command line.

pub mod auth;
pub mod console;
pub mod device;
pub mod settings;

pub use auth::HttpAuthService;
pub use console::LineConsole;
pub use device::DeviceCommunicator;
pub use settings::{ConfigError, SessionSettings, SettingsFile};
