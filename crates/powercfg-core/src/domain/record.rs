//! Device configuration records pushed to the device as one JSON line.
//!
//! Two wire shapes exist:
//!
//! - [`MqttConfiguration`] – the first shape, used by V1 firmware.  Carries the
//!   MQTT key directly.
//! - [`MqttConfigurationV2`] – the second shape, used by V2 and later.  Adds
//!   the MAC, API server, user id and location, and omits the key (the device
//!   fetches it itself after joining the network).
//!
//! Struct field order is the JSON key order on the wire.

use serde::{Deserialize, Serialize};

use super::defaults;
use super::fields::{FieldKey, FieldValues};

/// First record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttConfiguration {
    pub server_addr: String,
    pub server_port: String,
    pub ssl_support: String,
    pub ssid: String,
    pub pass: String,
    pub mqtt_key: String,
    pub company: String,
    pub model: String,
    pub topic: String,
}

impl Default for MqttConfiguration {
    fn default() -> Self {
        Self {
            server_addr: defaults::BROKER_ADDR.to_string(),
            server_port: defaults::BROKER_PORT.to_string(),
            ssl_support: defaults::SSL_SUPPORT.to_string(),
            ssid: String::new(),
            pass: String::new(),
            mqtt_key: String::new(),
            company: defaults::COMPANY.to_string(),
            model: String::new(),
            topic: defaults::TOPIC.to_string(),
        }
    }
}

impl MqttConfiguration {
    /// Builds the record from collected values; fields that were not asked
    /// keep their defaults.
    pub fn from_fields(values: &FieldValues) -> Self {
        let mut record = Self::default();
        assign(&mut record.server_addr, values, FieldKey::ServerAddr);
        assign(&mut record.server_port, values, FieldKey::ServerPort);
        assign(&mut record.ssl_support, values, FieldKey::SslSupport);
        assign(&mut record.ssid, values, FieldKey::Ssid);
        assign(&mut record.pass, values, FieldKey::Password);
        assign(&mut record.mqtt_key, values, FieldKey::MqttKey);
        assign(&mut record.model, values, FieldKey::Model);
        assign(&mut record.topic, values, FieldKey::Topic);
        record
    }
}

/// Second record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttConfigurationV2 {
    pub mac: String,
    pub api_server_addr: String,
    pub api_server_port: String,
    pub server_addr: String,
    pub server_port: String,
    pub ssl_support: String,
    pub ssid: String,
    pub pass: String,
    pub user_id: String,
    pub company: String,
    pub model: String,
    pub lati: String,
    pub long: String,
    pub topic: String,
}

impl Default for MqttConfigurationV2 {
    fn default() -> Self {
        Self {
            mac: String::new(),
            api_server_addr: defaults::API_SERVER_ADDR.to_string(),
            api_server_port: defaults::API_SERVER_PORT.to_string(),
            server_addr: defaults::BROKER_ADDR.to_string(),
            server_port: defaults::BROKER_PORT.to_string(),
            ssl_support: defaults::SSL_SUPPORT.to_string(),
            ssid: String::new(),
            pass: String::new(),
            user_id: String::new(),
            company: defaults::COMPANY.to_string(),
            model: String::new(),
            lati: defaults::LATITUDE.to_string(),
            long: defaults::LONGITUDE.to_string(),
            topic: defaults::TOPIC.to_string(),
        }
    }
}

impl MqttConfigurationV2 {
    /// Builds the record from collected values; fields that were not asked
    /// keep their defaults.  `ssl_support` is never operator-editable here.
    pub fn from_fields(values: &FieldValues) -> Self {
        let mut record = Self::default();
        assign(&mut record.mac, values, FieldKey::Mac);
        assign(&mut record.api_server_addr, values, FieldKey::ApiServerAddr);
        assign(&mut record.api_server_port, values, FieldKey::ApiServerPort);
        assign(&mut record.server_addr, values, FieldKey::ServerAddr);
        assign(&mut record.server_port, values, FieldKey::ServerPort);
        assign(&mut record.ssid, values, FieldKey::Ssid);
        assign(&mut record.pass, values, FieldKey::Password);
        assign(&mut record.user_id, values, FieldKey::UserId);
        assign(&mut record.model, values, FieldKey::Model);
        assign(&mut record.topic, values, FieldKey::Topic);
        record
    }
}

fn assign(slot: &mut String, values: &FieldValues, key: FieldKey) {
    if let Some(value) = values.get(key) {
        *slot = value.to_string();
    }
}

/// The record pushed in one session, in whichever shape the version uses.
///
/// Serializes transparently as the inner record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeviceRecord {
    Legacy(MqttConfiguration),
    Extended(MqttConfigurationV2),
}

impl DeviceRecord {
    /// Location sent alongside the issuance request for this shape.
    pub fn coordinates(&self) -> (&str, &str) {
        match self {
            DeviceRecord::Legacy(_) => (defaults::UNKNOWN_COORDINATE, defaults::UNKNOWN_COORDINATE),
            DeviceRecord::Extended(r) => (r.lati.as_str(), r.long.as_str()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
