//! Operator-selected protocol generations.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The mode string did not name a supported protocol version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownVersionError(pub String);

/// Closed set of provisioning workflows, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    /// B540 firmware up to v1.01.26 (and M130).
    V1,
    /// B540 firmware v1.01.28.
    V2,
    /// B540 firmware v1.01.30.
    V3,
    /// B550.
    V4,
    /// Device already joined the network; backend round trips only.
    Reconfig,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 5] = [
        ProtocolVersion::V1,
        ProtocolVersion::V2,
        ProtocolVersion::V3,
        ProtocolVersion::V4,
        ProtocolVersion::Reconfig,
    ];

    /// Resolves an operator-typed mode.  A blank answer selects V1.
    pub fn from_mode(mode: &str) -> Result<Self, UnknownVersionError> {
        let mode = mode.trim();
        if mode.is_empty() {
            return Ok(ProtocolVersion::V1);
        }
        mode.parse()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolVersion::V1 => "V1",
            ProtocolVersion::V2 => "V2",
            ProtocolVersion::V3 => "V3",
            ProtocolVersion::V4 => "V4",
            ProtocolVersion::Reconfig => "RECONFIG",
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = UnknownVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVersionError(s.to_string()))
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
