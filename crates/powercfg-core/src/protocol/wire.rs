//! Line-oriented device framing.
//!
//! Wire exchange:
//! ```text
//! PC  -> DUT   [DUT<-PC] START\n
//! PC  -> DUT   hello tcp SUCCESS_CONNECT\n
//! DUT -> PC    [DUT->PC] START_OK:<MAC>#
//! PC  -> DUT   {"server_addr":...}\n          (one JSON object per line)
//! DUT -> PC    <status text>                  (one read, <= 1500 bytes)
//! PC  -> DUT   {"delay":"0"}\n  or  {"mac":"<mac>","command":"connectap"}\n
//! ```
//! Every PC-to-device message is newline-terminated.  Device replies are read
//! as a single buffered chunk with no reassembly across reads.

use serde::{Deserialize, Serialize};

/// First control line sent after connecting.
pub const START_MESSAGE: &str = "[DUT<-PC] START\n";

/// Second control line sent after connecting.
pub const HELLO_MESSAGE: &str = "hello tcp SUCCESS_CONNECT\n";

/// Marker that precedes the MAC in the device greeting.
pub const GREETING_PREFIX: &str = "[DUT->PC] START_OK:";

/// Size of the single read used for every device reply.
pub const RECEIVE_BUFFER_SIZE: usize = 1500;

/// Command name carried by [`ConnectApRequest`].
pub const CONNECT_AP_COMMAND: &str = "connectap";

/// Prefix of the status lines a B550 sends while it waits for the operator
/// to press its button.
pub const BUTTON_PREFIX: &str = "[DUT->PC] BUTTON_";

/// Auxiliary command telling the device how long to wait before rebooting
/// into station mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayMessage {
    pub delay: String,
}

impl Default for DelayMessage {
    fn default() -> Self {
        Self {
            delay: "0".to_string(),
        }
    }
}

/// Auxiliary command asking the device to join the configured access point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectApRequest {
    pub mac: String,
    pub command: String,
}

impl ConnectApRequest {
    pub fn new(mac: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            command: CONNECT_AP_COMMAND.to_string(),
        }
    }
}

/// Extracts the MAC token from a device greeting.
///
/// Matches `[DUT->PC] START_OK:<token>#` where `<token>` is a run of one or
/// more non-whitespace characters.  The token is greedy: if the run contains
/// several `#`, everything up to the last one is returned.  The first marker
/// occurrence that yields a match wins.
///
/// Returns `None` when no occurrence matches.
///
/// # Examples
///
/// ```rust
/// use powercfg_core::parse_device_mac;
///
/// assert_eq!(parse_device_mac("[DUT->PC] START_OK:AABBCCDDEEFF#"), Some("AABBCCDDEEFF"));
/// assert_eq!(parse_device_mac("garbage"), None);
/// ```
pub fn parse_device_mac(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(GREETING_PREFIX) {
        let token_start = search_from + offset + GREETING_PREFIX.len();
        let rest = &text[token_start..];
        let run_len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let run = &rest[..run_len];

        if let Some(hash) = run.rfind('#') {
            if hash > 0 {
                return Some(&run[..hash]);
            }
        }
        search_from = token_start;
    }
    None
}

/// Serializes `value` as single-line JSON followed by `\n`.
///
/// # Errors
///
/// Returns the `serde_json` error if `value` cannot be serialized.
///
/// # Examples
///
/// ```rust
/// use powercfg_core::{encode_json_line, DelayMessage};
///
/// let bytes = encode_json_line(&DelayMessage::default()).unwrap();
/// assert_eq!(bytes, b"{\"delay\":\"0\"}\n");
/// ```
pub fn encode_json_line<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
