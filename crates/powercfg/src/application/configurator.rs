//! Configurator: the lifecycle wrapper around one provisioning session.
//!
//! A configurator is created for one [`ProtocolVersion`], initialized with a
//! [`SessionConfig`] and its ports, configured once, and disposed.
//!
//! ```text
//!   new ──► Uninitialized ──initialize──► Ready ──configure──► Ready
//!                 │                         │
//!                 └──────────dispose────────┴──────────────► Disposed
//! ```
//!
//! `configure` always closes the device connection before it returns,
//! whether the run succeeded or failed.  Dropping a configurator in the
//! `Ready` state drops the device link too, which releases its socket.

use powercfg_core::ProtocolVersion;
use tracing::{info, warn};

use super::error::ProvisionError;
use super::pipeline::{self, ProvisionOutcome, Session};
use super::ports::{AuthService, Console, DeviceLink};
use super::workflow::Workflow;
use crate::domain::SessionConfig;

enum Lifecycle {
    Uninitialized,
    Ready(Session),
    Disposed,
}

/// Drives one provisioning session for a single protocol version.
pub struct Configurator {
    workflow: &'static Workflow,
    state: Lifecycle,
}

impl Configurator {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            workflow: Workflow::for_version(version),
            state: Lifecycle::Uninitialized,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.workflow.version
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, Lifecycle::Ready(_))
    }

    /// Binds the session settings and ports, and opens the device
    /// connection for versions that have a device phase.
    ///
    /// # Errors
    ///
    /// - [`ProvisionError::Disposed`] after [`Configurator::dispose`].
    /// - [`ProvisionError::DeviceUnavailable`] when a device-phase version is
    ///   given no device link.
    /// - [`ProvisionError::Device`] when the connection cannot be opened.
    pub async fn initialize(
        &mut self,
        config: SessionConfig,
        auth: Box<dyn AuthService>,
        device: Option<Box<dyn DeviceLink>>,
        mut console: Box<dyn Console>,
    ) -> Result<(), ProvisionError> {
        if matches!(self.state, Lifecycle::Disposed) {
            return Err(ProvisionError::Disposed);
        }

        // Re-initializing releases the previous connection first.
        if let Lifecycle::Ready(previous) = &mut self.state {
            if let Some(link) = previous.device.as_mut() {
                link.close().await;
            }
            self.state = Lifecycle::Uninitialized;
        }

        let device = if self.workflow.uses_device() {
            let mut link =
                device.ok_or(ProvisionError::DeviceUnavailable(self.workflow.version.as_str()))?;
            link.initialize(&config, console.as_mut()).await?;
            Some(link)
        } else {
            None
        };

        info!(version = %self.workflow.version, device = %config.device_addr(), "configurator initialized");
        self.state = Lifecycle::Ready(Session {
            config,
            auth,
            device,
            console,
        });
        Ok(())
    }

    /// Runs the version's workflow once.
    ///
    /// The device connection is closed before this returns, on success and
    /// on failure alike.
    pub async fn configure(&mut self) -> Result<ProvisionOutcome, ProvisionError> {
        let session = match &mut self.state {
            Lifecycle::Uninitialized => return Err(ProvisionError::NotInitialized),
            Lifecycle::Disposed => return Err(ProvisionError::Disposed),
            Lifecycle::Ready(session) => session,
        };

        info!(version = %self.workflow.version, "provisioning started");
        let result = pipeline::execute(self.workflow, session).await;

        if let Some(link) = session.device.as_mut() {
            link.close().await;
        }

        match &result {
            Ok(outcome) => info!(mac = %outcome.mac, "provisioning finished"),
            Err(e) => warn!(error = %e, "provisioning aborted"),
        }
        result
    }

    /// Releases the device connection.  Safe to call more than once.
    pub async fn dispose(&mut self) {
        let previous = std::mem::replace(&mut self.state, Lifecycle::Disposed);
        if let Lifecycle::Ready(mut session) = previous {
            if let Some(link) = session.device.as_mut() {
                link.close().await;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DeviceError, MockAuthService};
    use async_trait::async_trait;
    use powercfg_core::{ConnectApRequest, DelayMessage, DeviceRecord};
    use std::sync::{Arc, Mutex};

    /// Device double that only counts lifecycle calls.
    #[derive(Clone, Default)]
    struct CountingDevice {
        initialized: Arc<Mutex<u32>>,
        closed: Arc<Mutex<u32>>,
        fail_connect: bool,
    }

    #[async_trait]
    impl DeviceLink for CountingDevice {
        async fn initialize(
            &mut self,
            _config: &SessionConfig,
            _console: &mut dyn Console,
        ) -> Result<(), DeviceError> {
            if self.fail_connect {
                return Err(DeviceError::NotConnected);
            }
            *self.initialized.lock().unwrap() += 1;
            Ok(())
        }
        async fn send_start_message(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
        async fn send_hello_message(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
        async fn receive_device_mac(
            &mut self,
            _console: &mut dyn Console,
        ) -> Result<String, DeviceError> {
            Err(DeviceError::NotConnected)
        }
        async fn push_configuration(&mut self, _record: &DeviceRecord) -> Result<usize, DeviceError> {
            Ok(0)
        }
        async fn receive_message(&mut self) -> Result<String, DeviceError> {
            Ok(String::new())
        }
        async fn send_delay_message(&mut self, _message: &DelayMessage) -> Result<(), DeviceError> {
            Ok(())
        }
        async fn send_connect_ap_request(
            &mut self,
            _request: &ConnectApRequest,
        ) -> Result<(), DeviceError> {
            Ok(())
        }
        async fn close(&mut self) {
            *self.closed.lock().unwrap() += 1;
        }
    }

    struct SilentConsole;

    #[async_trait]
    impl Console for SilentConsole {
        async fn read_line(&mut self) -> std::io::Result<Option<String>> {
            Ok(None)
        }
        async fn write(&mut self, _text: &str) -> std::io::Result<()> {
            Ok(())
        }
        async fn write_line(&mut self, _text: &str) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn make_config() -> SessionConfig {
        SessionConfig::new("127.0.0.1".parse().unwrap(), 5000, "https://backend:8443")
    }

    #[tokio::test]
    async fn test_configure_before_initialize_is_rejected() {
        let mut configurator = Configurator::new(ProtocolVersion::V1);
        let err = configurator.configure().await.unwrap_err();
        assert!(matches!(err, ProvisionError::NotInitialized));
    }

    #[tokio::test]
    async fn test_configure_after_dispose_is_rejected() {
        let mut configurator = Configurator::new(ProtocolVersion::V2);
        configurator.dispose().await;
        let err = configurator.configure().await.unwrap_err();
        assert!(matches!(err, ProvisionError::Disposed));
    }

    #[tokio::test]
    async fn test_initialize_after_dispose_is_rejected() {
        let mut configurator = Configurator::new(ProtocolVersion::Reconfig);
        configurator.dispose().await;
        let err = configurator
            .initialize(
                make_config(),
                Box::new(MockAuthService::new()),
                None,
                Box::new(SilentConsole),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Disposed));
    }

    #[tokio::test]
    async fn test_device_version_requires_a_device() {
        let mut configurator = Configurator::new(ProtocolVersion::V3);
        let err = configurator
            .initialize(
                make_config(),
                Box::new(MockAuthService::new()),
                None,
                Box::new(SilentConsole),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::DeviceUnavailable("V3")));
        assert!(!configurator.is_ready());
    }

    #[tokio::test]
    async fn test_initialize_opens_device_once() {
        // Arrange
        let device = CountingDevice::default();
        let mut configurator = Configurator::new(ProtocolVersion::V1);

        // Act
        configurator
            .initialize(
                make_config(),
                Box::new(MockAuthService::new()),
                Some(Box::new(device.clone())),
                Box::new(SilentConsole),
            )
            .await
            .unwrap();

        // Assert
        assert!(configurator.is_ready());
        assert_eq!(*device.initialized.lock().unwrap(), 1);
        assert_eq!(*device.closed.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_configurator_uninitialized() {
        let device = CountingDevice {
            fail_connect: true,
            ..CountingDevice::default()
        };
        let mut configurator = Configurator::new(ProtocolVersion::V2);

        let err = configurator
            .initialize(
                make_config(),
                Box::new(MockAuthService::new()),
                Some(Box::new(device)),
                Box::new(SilentConsole),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Device(DeviceError::NotConnected)));
        assert!(matches!(
            configurator.configure().await,
            Err(ProvisionError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_failed_configure_still_closes_device() {
        // Arrange: the device fails the handshake read
        let device = CountingDevice::default();
        let mut configurator = Configurator::new(ProtocolVersion::V1);
        configurator
            .initialize(
                make_config(),
                Box::new(MockAuthService::new()),
                Some(Box::new(device.clone())),
                Box::new(SilentConsole),
            )
            .await
            .unwrap();

        // Act
        let result = configurator.configure().await;

        // Assert
        assert!(matches!(
            result,
            Err(ProvisionError::Device(DeviceError::NotConnected))
        ));
        assert_eq!(*device.closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dispose_twice_is_safe() {
        let device = CountingDevice::default();
        let mut configurator = Configurator::new(ProtocolVersion::V4);
        configurator
            .initialize(
                make_config(),
                Box::new(MockAuthService::new()),
                Some(Box::new(device.clone())),
                Box::new(SilentConsole),
            )
            .await
            .unwrap();

        configurator.dispose().await;
        configurator.dispose().await;

        assert_eq!(*device.closed.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reconfig_initializes_without_device() {
        let mut configurator = Configurator::new(ProtocolVersion::Reconfig);
        configurator
            .initialize(
                make_config(),
                Box::new(MockAuthService::new()),
                None,
                Box::new(SilentConsole),
            )
            .await
            .unwrap();
        assert!(configurator.is_ready());
        assert_eq!(configurator.version(), ProtocolVersion::Reconfig);
    }
}
