//! Session-level error taxonomy.
//!
//! Nothing here is recovered locally: every variant aborts the session and
//! surfaces to the top-level caller.

use powercfg_core::{FieldKey, UnknownVersionError};
use thiserror::Error;

use super::ports::{AuthError, DeviceError};

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Device connect, handshake, push or receive failed.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Issuance or backend call failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A required field was left blank.
    #[error("required field '{field}' was left blank")]
    MissingField { field: FieldKey },

    /// `configure` was called before `initialize`.
    #[error("configurator is not initialized")]
    NotInitialized,

    /// The configurator was already disposed.
    #[error("configurator has been disposed")]
    Disposed,

    /// A device-phase workflow was initialized without a device link.
    #[error("the {0} workflow needs a device connection but none was supplied")]
    DeviceUnavailable(&'static str),

    #[error(transparent)]
    UnknownVersion(#[from] UnknownVersionError),

    /// Reading operator input or writing to the console failed.
    #[error("console I/O error: {0}")]
    Console(#[from] std::io::Error),
}

impl ProvisionError {
    /// The field name for [`ProvisionError::MissingField`].
    pub fn missing_field(&self) -> Option<&'static str> {
        match self {
            ProvisionError::MissingField { field } => Some(field.name()),
            _ => None,
        }
    }
}
