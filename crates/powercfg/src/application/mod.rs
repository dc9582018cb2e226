//! Application layer: the provisioning workflows.
//!
//! - `ports`        : traits for the device link, the backend and the console
//! - `workflow`     : per-version step tables
//! - `pipeline`     : interpreter that runs a step table against a session
//! - `configurator` : initialize / configure / dispose lifecycle
//! - `error`        : session-level error type

pub mod configurator;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod workflow;

pub use configurator::Configurator;
pub use error::ProvisionError;
pub use pipeline::{ProvisionOutcome, Session, NETWORK_RESTORE_PROMPT};
pub use ports::{AuthError, AuthService, Console, DeviceError, DeviceLink};
pub use workflow::{FieldDefault, FieldSpec, RecordShape, Step, VerifySource, Workflow};
