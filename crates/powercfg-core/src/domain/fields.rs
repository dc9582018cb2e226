//! Named operator fields and the values collected for them.

use std::collections::BTreeMap;
use std::fmt;

/// Every field the operator can be asked for, across all protocol versions.
///
/// [`FieldKey::name`] is the snake_case key used on the wire (or, for the
/// Reconfigurator-only fields, the name reported in a missing-field error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Mac,
    ApiServerAddr,
    ApiServerPort,
    ServerAddr,
    ServerPort,
    SslSupport,
    Ssid,
    Password,
    Model,
    UserId,
    MqttKey,
    Topic,
    /// Verify flag typed by the operator (Reconfigurator only).
    Verify,
    /// Whether to push the new key to the backend (Reconfigurator only).
    UpdateKey,
}

impl FieldKey {
    /// Returns the wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            FieldKey::Mac => "mac",
            FieldKey::ApiServerAddr => "api_server_addr",
            FieldKey::ApiServerPort => "api_server_port",
            FieldKey::ServerAddr => "server_addr",
            FieldKey::ServerPort => "server_port",
            FieldKey::SslSupport => "ssl_support",
            FieldKey::Ssid => "ssid",
            FieldKey::Password => "pass",
            FieldKey::Model => "model",
            FieldKey::UserId => "user_id",
            FieldKey::MqttKey => "mqtt_key",
            FieldKey::Topic => "topic",
            FieldKey::Verify => "verify",
            FieldKey::UpdateKey => "update_key",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values collected during one session, keyed by field.
///
/// A value is only inserted after default substitution, so every stored
/// value is final.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues(BTreeMap<FieldKey, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FieldKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    /// Returns the collected value, or `fallback` when the field was never
    /// asked in this session.
    pub fn get_or<'a>(&'a self, key: FieldKey, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
