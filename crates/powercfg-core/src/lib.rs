//! # powercfg-core
//!
//! Shared library for the power-manager provisioning tool containing the
//! device configuration records, the defaults table, the auth request and
//! response records, and the line-oriented device wire framing.
//!
//! This crate has zero dependencies on sockets, HTTP clients, or consoles.
//! Everything here is plain data plus pure functions, so it can be tested
//! without a device on the bench.
//!
//! # What is being provisioned? (for beginners)
//!
//! A power-management unit (the DUT, "device under test") ships without Wi-Fi
//! or MQTT broker credentials.  A provisioning PC connects to the device over
//! raw TCP, exchanges a short text handshake to learn the device MAC, and then
//! pushes a single JSON line describing the network and broker settings.  The
//! MQTT key in that JSON is minted by a backend issuance endpoint.
//!
//! - **`domain`** – What gets sent: configuration records in two wire shapes,
//!   the field keys the operator fills in, the defaults table, the protocol
//!   versions, and the backend auth records.
//!
//! - **`protocol`** – How it gets sent: the fixed control lines, MAC
//!   extraction from the device greeting, and newline-terminated JSON framing.

pub mod domain;
pub mod protocol;

pub use domain::auth::{AddAuthRequest, MqttAuth, MqttAuthRequest, MqttKeyUpdateRequest};
pub use domain::fields::{FieldKey, FieldValues};
pub use domain::record::{DeviceRecord, MqttConfiguration, MqttConfigurationV2};
pub use domain::version::{ProtocolVersion, UnknownVersionError};
pub use protocol::wire::{
    encode_json_line, parse_device_mac, ConnectApRequest, DelayMessage, BUTTON_PREFIX,
    GREETING_PREFIX, HELLO_MESSAGE, RECEIVE_BUFFER_SIZE, START_MESSAGE,
};
