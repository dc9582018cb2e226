//! Request and response bodies exchanged with the credential backend.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/devices/register/create` on the issuance host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttAuthRequest {
    pub account: Account,
    pub device: DeviceInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub mac: String,
    pub model_id: String,
    pub company: String,
    pub lati: String,
    pub long: String,
    pub verify: String,
}

impl MqttAuthRequest {
    pub fn new(
        user_id: impl Into<String>,
        mac: impl Into<String>,
        model_id: impl Into<String>,
        (lati, long): (&str, &str),
        verify: impl Into<String>,
    ) -> Self {
        Self {
            account: Account {
                user_id: user_id.into(),
            },
            device: DeviceInfo {
                mac: mac.into(),
                model_id: model_id.into(),
                company: super::defaults::COMPANY.to_string(),
                lati: lati.to_string(),
                long: long.to_string(),
                verify: verify.into(),
            },
        }
    }
}

/// Issuance response: the verify flag and the freshly minted key.
///
/// A missing `mqtt_key` is a decode failure; a missing `verify` decodes as
/// an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttAuth {
    #[serde(default)]
    pub verify: String,
    pub mqtt_key: String,
}

/// Body of `POST {backend}/api/auth/add`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddAuthRequest {
    pub user_id: String,
    pub device_id: String,
    pub verify: String,
    pub mqtt_key: String,
}

/// Body of `POST {backend}/rest/Auth/update_mqttKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MqttKeyUpdateRequest {
    pub device_id: String,
    pub mqtt_key: String,
}
