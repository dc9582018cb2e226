//! Domain types for device provisioning.
//!
//! Nothing in this module performs I/O.  Records are built incrementally from
//! operator answers and then handed to the infrastructure layer to be framed
//! onto the device socket or posted to the backend.

pub mod auth;
pub mod defaults;
pub mod fields;
pub mod record;
pub mod version;
