//! Domain layer for powercfg.
//!
//! Holds the immutable per-session settings.  Populating them from the
//! command line or a file is the job of `main.rs` and the infrastructure
//! layer.

pub mod config;

pub use config::{ClientCertificate, SessionConfig};
