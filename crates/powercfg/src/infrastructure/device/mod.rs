//! TCP link to the device being provisioned.
//!
//! The device runs a tiny line-oriented protocol on its own access point:
//!
//! ```text
//!   PC  ──► "[DUT<-PC] START\n"
//!   PC  ──► "hello tcp SUCCESS_CONNECT\n"
//!   PC  ◄── "[DUT->PC] START_OK:<MAC>#..."
//!   PC  ──► {"server_addr":...}\n          (configuration record)
//!   PC  ◄── status text                    (V2 and later)
//!   PC  ──► {"delay":"0"}\n  or  {"mac":...,"command":"connectap"}\n
//! ```
//!
//! Every read is a single `read` of at most 1500 bytes decoded as UTF-8
//! (invalid sequences are replaced).  There is no message framing on the
//! way in: whatever arrived in that one read is the message.

use async_trait::async_trait;
use powercfg_core::{
    encode_json_line, parse_device_mac, ConnectApRequest, DelayMessage, DeviceRecord,
    HELLO_MESSAGE, RECEIVE_BUFFER_SIZE, START_MESSAGE,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::application::ports::{Console, DeviceError, DeviceLink};
use crate::domain::SessionConfig;

/// Any byte stream the communicator can drive.
///
/// Production code uses a [`TcpStream`]; tests use scripted streams.
pub trait DeviceStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> DeviceStream for T {}

/// [`DeviceLink`] over a TCP connection.
#[derive(Default)]
pub struct DeviceCommunicator {
    stream: Option<Box<dyn DeviceStream>>,
}

impl DeviceCommunicator {
    /// Creates a communicator that connects during `initialize`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a communicator over an already-open stream.
    pub fn with_stream(stream: impl DeviceStream + 'static) -> Self {
        Self {
            stream: Some(Box::new(stream)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut Box<dyn DeviceStream>, DeviceError> {
        self.stream.as_mut().ok_or(DeviceError::NotConnected)
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<usize, DeviceError> {
        let stream = self.stream()?;
        stream.write_all(bytes).await?;
        stream.flush().await?;
        debug!(bytes = bytes.len(), "sent to device");
        Ok(bytes.len())
    }

    async fn receive(&mut self) -> Result<String, DeviceError> {
        let stream = self.stream()?;
        let mut buf = [0u8; RECEIVE_BUFFER_SIZE];
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            debug!("device closed its side of the connection");
        }
        Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
    }
}

#[async_trait]
impl DeviceLink for DeviceCommunicator {
    async fn initialize(
        &mut self,
        config: &SessionConfig,
        console: &mut dyn Console,
    ) -> Result<(), DeviceError> {
        if self.stream.is_none() {
            let addr = config.device_addr();
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|source| DeviceError::Connect { addr, source })?;
            info!(%addr, "connected to device");
            self.stream = Some(Box::new(stream));
        }
        console
            .write_line(&format!("{}:{} Connected", config.device_ip, config.device_port))
            .await?;
        Ok(())
    }

    async fn send_start_message(&mut self) -> Result<(), DeviceError> {
        self.send(START_MESSAGE.as_bytes()).await.map(|_| ())
    }

    async fn send_hello_message(&mut self) -> Result<(), DeviceError> {
        self.send(HELLO_MESSAGE.as_bytes()).await.map(|_| ())
    }

    async fn receive_device_mac(
        &mut self,
        console: &mut dyn Console,
    ) -> Result<String, DeviceError> {
        let greeting = self.receive().await?;
        debug!(%greeting, "device greeting");
        console.write_line(&greeting).await?;
        Ok(parse_device_mac(&greeting).unwrap_or_default().to_string())
    }

    async fn push_configuration(&mut self, record: &DeviceRecord) -> Result<usize, DeviceError> {
        let frame = encode_json_line(record)?;
        self.send(&frame).await
    }

    async fn receive_message(&mut self) -> Result<String, DeviceError> {
        self.receive().await
    }

    async fn send_delay_message(&mut self, message: &DelayMessage) -> Result<(), DeviceError> {
        let frame = encode_json_line(message)?;
        self.send(&frame).await.map(|_| ())
    }

    async fn send_connect_ap_request(
        &mut self,
        request: &ConnectApRequest,
    ) -> Result<(), DeviceError> {
        let frame = encode_json_line(request)?;
        self.send(&frame).await.map(|_| ())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!("device shutdown failed: {e}");
            }
            info!("device connection released");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
