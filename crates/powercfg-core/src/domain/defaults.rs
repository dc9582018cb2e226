//! Documented default values substituted for blank operator answers.
//!
//! | Constant                   | Value                 |
//! |----------------------------|-----------------------|
//! | `BROKER_ADDR`              | `dwmqtt.dawonai.com`  |
//! | `BROKER_PORT`              | `8883`                |
//! | `SSL_SUPPORT_PROMPTED`     | `no`                  |
//! | `SSL_SUPPORT`              | `yes`                 |
//! | `API_SERVER_ADDR`          | `dwapi.dawonai.com`   |
//! | `API_SERVER_PORT`          | `18443`               |
//! | `TOPIC`                    | `dwd`                 |
//! | `COMPANY`                  | `DAWONDNS`            |
//! | `LATITUDE` / `LONGITUDE`   | `37.6523018` / `127.0622559` |

/// MQTT broker host written into every record.
pub const BROKER_ADDR: &str = "dwmqtt.dawonai.com";

/// MQTT broker port (TLS).
pub const BROKER_PORT: &str = "8883";

/// Default answer to the V1 SSL prompt.
///
/// The V1 record itself starts out as `"yes"`, but the prompt advertises
/// `"no"` and a blank answer writes `"no"`.
pub const SSL_SUPPORT_PROMPTED: &str = "no";

/// SSL flag for record shapes that do not prompt for it.
pub const SSL_SUPPORT: &str = "yes";

/// API server host for the second record shape.
pub const API_SERVER_ADDR: &str = "dwapi.dawonai.com";

/// API server port for the second record shape.
pub const API_SERVER_PORT: &str = "18443";

/// MQTT topic prefix.
pub const TOPIC: &str = "dwd";

/// Company constant sent to the device and the issuance endpoint.
pub const COMPANY: &str = "DAWONDNS";

pub const LATITUDE: &str = "37.6523018";
pub const LONGITUDE: &str = "127.0622559";

/// Coordinates sent in issuance requests that carry no location.
pub const UNKNOWN_COORDINATE: &str = "0";

/// Default answer for yes/no style confirmation prompts.
pub const CONFIRM: &str = "true";
