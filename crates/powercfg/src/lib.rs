//! powercfg library crate.
//!
//! Provisions a power-management device with Wi-Fi and MQTT broker
//! credentials, and records the issued MQTT key with the backend.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Operator (console prompts)
//!         ↕
//! [powercfg]
//!   ├── domain/           SessionConfig
//!   ├── application/      Ports, per-version step tables, Configurator pipeline
//!   └── infrastructure/
//!         ├── device/     TCP connection to the device (powercfg-core framing)
//!         ├── auth/       HTTPS calls to the issuance host and backend
//!         ├── console     Line-based prompt I/O
//!         └── settings    Optional TOML session file
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `powercfg-core` only; it talks to
//!   the outside world through the traits in `application::ports`.
//! - `infrastructure` implements those traits with `tokio` and `reqwest`.

/// Domain layer: session configuration.
pub mod domain;

/// Application layer: the provisioning workflows.
pub mod application;

/// Infrastructure layer: device socket, HTTPS client, console, settings file.
pub mod infrastructure;
