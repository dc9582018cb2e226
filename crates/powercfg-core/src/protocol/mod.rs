//! Device wire protocol: fixed control lines, greeting parsing, JSON framing.

pub mod wire;

pub use wire::{
    encode_json_line, parse_device_mac, ConnectApRequest, DelayMessage, BUTTON_PREFIX, GREETING_PREFIX,
    HELLO_MESSAGE, RECEIVE_BUFFER_SIZE, START_MESSAGE,
};
