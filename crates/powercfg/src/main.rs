//! powercfg entry point.
//!
//! Provisions one power-manager device per run:
//!
//! ```text
//! main()
//!  ├─ parse CLI (+ optional TOML session file)
//!  ├─ print banner, pick the protocol version (flag or prompt)
//!  └─ session span
//!       └─ Configurator::initialize → configure → dispose
//! ```
//!
//! # What happens at startup
//!
//! 1. `tracing_subscriber` is initialised to write logs to stderr, so the
//!    prompts on stdout stay readable.  The level is controlled by
//!    `RUST_LOG` (default `info`).
//! 2. CLI arguments are parsed with `clap`.  Every flag can also come from a
//!    `POWERCFG_*` environment variable, and `--config` names a TOML file
//!    whose `[session]` table fills in anything the command line leaves out.
//! 3. The operator picks a mode unless `--mode` was given.  A blank answer
//!    selects V1.
//! 4. The configurator for that mode runs once inside a `session` span
//!    tagged with a fresh UUID.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use powercfg::application::{Configurator, Console, DeviceLink, Workflow};
use powercfg::domain::SessionConfig;
use powercfg::infrastructure::{
    DeviceCommunicator, HttpAuthService, LineConsole, SessionSettings, SettingsFile,
};
use powercfg_core::ProtocolVersion;

const MODE_PROMPT: &str = "Mode V1 (B540 <= v1.01.26) or V2 (B540 == v1.01.28) or V3 (B540 == v1.01.30) or V4 (B550) or RECONFIG (default V1): ";

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Power-manager device provisioning tool.
///
/// Connects to a device on its provisioning access point, pushes Wi-Fi and
/// MQTT broker settings, and records the issued MQTT key with the backend.
#[derive(Debug, Parser)]
#[command(
    name = "powercfg",
    about = "Provisions power-manager devices with Wi-Fi and MQTT credentials",
    version
)]
struct Cli {
    /// IP address of the device on its provisioning network.
    #[arg(long, env = "POWERCFG_HOST")]
    host: Option<String>,

    /// TCP port the device listens on.
    #[arg(long, env = "POWERCFG_PORT")]
    port: Option<u16>,

    /// Base address of the backend, e.g. `https://backend.example:8443`.
    #[arg(long, env = "POWERCFG_WEB_SERVER_ADDR")]
    web_server_addr: Option<String>,

    /// PKCS#12 client certificate for the key-update call.
    #[arg(long, env = "POWERCFG_CLIENT_CERTIFICATE")]
    client_certificate: Option<PathBuf>,

    /// Password of the client certificate.
    #[arg(long, env = "POWERCFG_CLIENT_CERTIFICATE_PASSWORD", hide_env_values = true)]
    client_certificate_password: Option<String>,

    /// TOML file with a `[session]` table of defaults for the flags above.
    #[arg(long, env = "POWERCFG_CONFIG")]
    config: Option<PathBuf>,

    /// Protocol version to run (V1, V2, V3, V4 or RECONFIG); prompts when
    /// absent.
    #[arg(long, env = "POWERCFG_MODE")]
    mode: Option<String>,
}

impl Cli {
    /// Settings given on the command line (or via the environment).
    fn overrides(&self) -> SessionSettings {
        SessionSettings {
            host: self.host.clone(),
            port: self.port,
            web_server_addr: self.web_server_addr.clone(),
            client_certificate: self.client_certificate.clone(),
            client_certificate_password: self.client_certificate_password.clone(),
            mode: self.mode.clone(),
        }
    }

    /// Merges the optional settings file under the command-line values.
    ///
    /// # Errors
    ///
    /// Returns an error if `--config` names a file that cannot be read or
    /// parsed.
    fn into_settings(self) -> anyhow::Result<SessionSettings> {
        let base = match &self.config {
            Some(path) => {
                SettingsFile::load(path)
                    .with_context(|| format!("failed to load settings from {}", path.display()))?
                    .session
            }
            None => SessionSettings::default(),
        };
        Ok(base.overlay(self.overrides()))
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.into_settings()?;
    let mode = settings.mode.clone();
    let config = settings
        .into_config()
        .context("incomplete session settings")?;

    let mut console = LineConsole::stdio();
    console
        .write_line(&format!("powercfg {}", env!("CARGO_PKG_VERSION")))
        .await?;

    let version = match mode {
        Some(mode) => ProtocolVersion::from_mode(&mode)?,
        None => prompt_mode(&mut console).await?,
    };

    let session_id = Uuid::new_v4();
    run_session(version, config, Box::new(console))
        .instrument(info_span!("session", id = %session_id, version = %version))
        .await
}

/// Asks the operator which protocol version to run.
async fn prompt_mode(console: &mut dyn Console) -> anyhow::Result<ProtocolVersion> {
    console.write(MODE_PROMPT).await?;
    let answer = console.read_line().await?.unwrap_or_default();
    Ok(ProtocolVersion::from_mode(&answer)?)
}

/// Runs one configurator lifecycle for `version`.
async fn run_session(
    version: ProtocolVersion,
    config: SessionConfig,
    console: Box<dyn Console>,
) -> anyhow::Result<()> {
    info!(device = %config.device_addr(), backend = %config.backend, "session starting");

    let device: Option<Box<dyn DeviceLink>> = if Workflow::for_version(version).uses_device() {
        Some(Box::new(DeviceCommunicator::new()))
    } else {
        None
    };

    let mut configurator = Configurator::new(version);
    configurator
        .initialize(config, Box::new(HttpAuthService::new()), device, console)
        .await
        .with_context(|| format!("failed to initialize the {version} configurator"))?;

    let result = configurator.configure().await;
    configurator.dispose().await;

    let outcome = result.with_context(|| format!("{version} provisioning failed"))?;
    info!(mac = %outcome.mac, "session complete");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
