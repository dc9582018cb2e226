//! Per-version step tables.
//!
//! Every protocol version is one [`Workflow`]: an ordered list of [`Step`]s,
//! the fields each collection step asks for (with their defaults), the record
//! shape pushed to the device, and where the issuance verify flag comes from.
//! The shared pipeline in [`super::pipeline`] interprets these tables, so the
//! differences between versions live here and nowhere else.
//!
//! | Version  | Issuance                          | Auxiliary steps                      | Verify  |
//! |----------|-----------------------------------|--------------------------------------|---------|
//! | V1       | before push, before the key prompt| none                                 | `false` |
//! | V2       | after push and close              | status, delay command                | `false` |
//! | V3       | after push and close              | status, Connect-AP, status           | `true`  |
//! | V4       | after push and close              | button prompts, Connect-AP, status   | `true`  |
//! | RECONFIG | no device phase                   | none                                 | operator|

use powercfg_core::domain::defaults;
use powercfg_core::{
    DeviceRecord, FieldKey, FieldValues, MqttConfiguration, MqttConfigurationV2, ProtocolVersion,
};

/// What a blank answer turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// No default; a blank answer is a missing-field error.
    Required,
    Literal(&'static str),
    /// The MAC reported in the device greeting.
    DeviceMac,
    /// The key returned by the issuance endpoint.
    IssuedKey,
}

/// One operator prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub label: &'static str,
    pub default: FieldDefault,
}

const fn field(key: FieldKey, label: &'static str, default: FieldDefault) -> FieldSpec {
    FieldSpec {
        key,
        label,
        default,
    }
}

/// One stage of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// START + hello control lines, then read the MAC greeting.
    Handshake,
    /// Prompt for each field in order.
    Collect(&'static [FieldSpec]),
    IssueCredentials,
    PushConfiguration,
    /// Read one status chunk and print it.
    RelayStatus,
    /// Read and print status chunks while the device reports button prompts.
    AwaitButtonRelease,
    SendDelay,
    SendConnectAp,
    CloseDevice,
    /// Wait for the operator to rejoin the regular network.
    AwaitNetwork,
    RecordAddition,
    UpdateKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    Legacy,
    Extended,
}

impl RecordShape {
    pub fn build(self, values: &FieldValues) -> DeviceRecord {
        match self {
            RecordShape::Legacy => DeviceRecord::Legacy(MqttConfiguration::from_fields(values)),
            RecordShape::Extended => {
                DeviceRecord::Extended(MqttConfigurationV2::from_fields(values))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifySource {
    Fixed(&'static str),
    /// Taken from an operator field (blank falls back to the field default).
    Field(FieldKey),
}

/// A complete per-version step table.
#[derive(Debug)]
pub struct Workflow {
    pub version: ProtocolVersion,
    pub steps: &'static [Step],
    pub record: Option<RecordShape>,
    pub verify: VerifySource,
}

impl Workflow {
    pub fn for_version(version: ProtocolVersion) -> &'static Workflow {
        match version {
            ProtocolVersion::V1 => &V1,
            ProtocolVersion::V2 => &V2,
            ProtocolVersion::V3 => &V3,
            ProtocolVersion::V4 => &V4,
            ProtocolVersion::Reconfig => &RECONFIG,
        }
    }

    /// Whether this workflow talks to the device over TCP at all.
    pub fn uses_device(&self) -> bool {
        self.steps.contains(&Step::Handshake)
    }

    /// Every field this workflow prompts for, in prompt order.
    pub fn fields(&self) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Collect(fields) => Some(*fields),
                _ => None,
            })
            .flatten()
    }
}

// ── Field tables ──────────────────────────────────────────────────────────────

use FieldDefault::{DeviceMac, IssuedKey, Literal, Required};

const V1_FIELDS_BEFORE_ISSUANCE: &[FieldSpec] = &[
    field(FieldKey::ServerAddr, "Server", Literal(defaults::BROKER_ADDR)),
    field(FieldKey::ServerPort, "Port", Literal(defaults::BROKER_PORT)),
    field(FieldKey::SslSupport, "SSL : no or yes", Literal(defaults::SSL_SUPPORT_PROMPTED)),
    field(FieldKey::Ssid, "SSID", Required),
    field(FieldKey::Password, "Wifi Password", Required),
    field(FieldKey::Model, "Model", Required),
    field(FieldKey::UserId, "UserId", Required),
];

const V1_FIELDS_AFTER_ISSUANCE: &[FieldSpec] = &[
    field(FieldKey::MqttKey, "Mqtt Server Password", IssuedKey),
    field(FieldKey::Topic, "Mqtt Topic", Literal(defaults::TOPIC)),
];

const V2_FIELDS: &[FieldSpec] = &[
    field(FieldKey::Mac, "MAC", DeviceMac),
    field(FieldKey::ApiServerAddr, "API Server", Literal(defaults::API_SERVER_ADDR)),
    field(FieldKey::ApiServerPort, "API Server Port", Literal(defaults::API_SERVER_PORT)),
    field(FieldKey::ServerAddr, "Mqtt Server", Literal(defaults::BROKER_ADDR)),
    field(FieldKey::ServerPort, "Mqtt Port", Literal(defaults::BROKER_PORT)),
    field(FieldKey::Ssid, "SSID", Required),
    field(FieldKey::Password, "Wifi Password", Required),
    field(FieldKey::Model, "Model", Required),
    field(FieldKey::UserId, "UserId", Required),
    field(FieldKey::Topic, "Mqtt Topic", Literal(defaults::TOPIC)),
];

const V3_FIELDS: &[FieldSpec] = &[
    field(FieldKey::Mac, "MAC", DeviceMac),
    field(FieldKey::Ssid, "SSID", Required),
    field(FieldKey::Password, "Wifi Password", Required),
    field(FieldKey::Model, "Model", Required),
    field(FieldKey::UserId, "UserId", Required),
    field(FieldKey::Topic, "Mqtt Topic", Literal(defaults::TOPIC)),
];

const RECONFIG_FIELDS: &[FieldSpec] = &[
    field(FieldKey::UserId, "UserId", Required),
    field(FieldKey::Mac, "MAC", Required),
    field(FieldKey::Model, "Model", Required),
    field(FieldKey::Verify, "Verify : true or false", Literal(defaults::CONFIRM)),
    field(FieldKey::UpdateKey, "Update device key : true or false", Literal(defaults::CONFIRM)),
];

// ── Step tables ───────────────────────────────────────────────────────────────

pub static V1: Workflow = Workflow {
    version: ProtocolVersion::V1,
    steps: &[
        Step::Handshake,
        Step::Collect(V1_FIELDS_BEFORE_ISSUANCE),
        Step::IssueCredentials,
        Step::Collect(V1_FIELDS_AFTER_ISSUANCE),
        Step::PushConfiguration,
        Step::CloseDevice,
        Step::AwaitNetwork,
        Step::RecordAddition,
        Step::UpdateKey,
    ],
    record: Some(RecordShape::Legacy),
    verify: VerifySource::Fixed("false"),
};

pub static V2: Workflow = Workflow {
    version: ProtocolVersion::V2,
    steps: &[
        Step::Handshake,
        Step::Collect(V2_FIELDS),
        Step::PushConfiguration,
        Step::RelayStatus,
        Step::SendDelay,
        Step::CloseDevice,
        Step::AwaitNetwork,
        Step::IssueCredentials,
        Step::RecordAddition,
        Step::UpdateKey,
    ],
    record: Some(RecordShape::Extended),
    verify: VerifySource::Fixed("false"),
};

pub static V3: Workflow = Workflow {
    version: ProtocolVersion::V3,
    steps: &[
        Step::Handshake,
        Step::Collect(V3_FIELDS),
        Step::PushConfiguration,
        Step::RelayStatus,
        Step::SendConnectAp,
        Step::RelayStatus,
        Step::CloseDevice,
        Step::AwaitNetwork,
        Step::IssueCredentials,
        Step::RecordAddition,
        Step::UpdateKey,
    ],
    record: Some(RecordShape::Extended),
    verify: VerifySource::Fixed("true"),
};

/// B550 flow.  Same prompts and record as V3, but after the push the device
/// asks for a button press; its `BUTTON_` messages are relayed until some
/// other status arrives.
pub static V4: Workflow = Workflow {
    version: ProtocolVersion::V4,
    steps: &[
        Step::Handshake,
        Step::Collect(V3_FIELDS),
        Step::PushConfiguration,
        Step::AwaitButtonRelease,
        Step::SendConnectAp,
        Step::RelayStatus,
        Step::CloseDevice,
        Step::AwaitNetwork,
        Step::IssueCredentials,
        Step::RecordAddition,
        Step::UpdateKey,
    ],
    record: Some(RecordShape::Extended),
    verify: VerifySource::Fixed("true"),
};

pub static RECONFIG: Workflow = Workflow {
    version: ProtocolVersion::Reconfig,
    steps: &[
        Step::Collect(RECONFIG_FIELDS),
        Step::IssueCredentials,
        Step::RecordAddition,
        Step::UpdateKey,
    ],
    record: None,
    verify: VerifySource::Field(FieldKey::Verify),
};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn position(workflow: &Workflow, step: Step) -> usize {
        workflow
            .steps
            .iter()
            .position(|s| *s == step)
            .unwrap_or_else(|| panic!("{step:?} missing from {}", workflow.version))
    }

    #[test]
    fn test_v1_issues_before_push() {
        assert!(position(&V1, Step::IssueCredentials) < position(&V1, Step::PushConfiguration));
    }

    #[test]
    fn test_v1_key_prompt_follows_issuance() {
        let issue = position(&V1, Step::IssueCredentials);
        let key_prompt = V1
            .steps
            .iter()
            .position(|s| matches!(s, Step::Collect(f) if f.iter().any(|f| f.default == IssuedKey)))
            .unwrap();
        assert!(issue < key_prompt);
    }

    #[test]
    fn test_later_versions_issue_after_close() {
        for workflow in [&V2, &V3, &V4] {
            assert!(
                position(workflow, Step::CloseDevice) < position(workflow, Step::IssueCredentials),
                "{} must issue after the device is closed",
                workflow.version
            );
        }
    }

    #[test]
    fn test_every_workflow_records_then_updates() {
        for version in ProtocolVersion::ALL {
            let workflow = Workflow::for_version(version);
            let issue = position(workflow, Step::IssueCredentials);
            let record = position(workflow, Step::RecordAddition);
            let update = position(workflow, Step::UpdateKey);
            assert!(issue < record && record < update, "{version}");
        }
    }

    #[test]
    fn test_verify_flags_per_version() {
        assert_eq!(V1.verify, VerifySource::Fixed("false"));
        assert_eq!(V2.verify, VerifySource::Fixed("false"));
        assert_eq!(V3.verify, VerifySource::Fixed("true"));
        assert_eq!(V4.verify, VerifySource::Fixed("true"));
    }

    #[test]
    fn test_only_v1_pushes_a_key() {
        assert!(V1.fields().any(|f| f.key == FieldKey::MqttKey));
        for workflow in [&V2, &V3, &V4] {
            assert!(!workflow.fields().any(|f| f.key == FieldKey::MqttKey));
            assert_eq!(workflow.record, Some(RecordShape::Extended));
        }
    }

    #[test]
    fn test_v3_has_no_broker_or_api_prompts() {
        let keys: Vec<FieldKey> = V3.fields().map(|f| f.key).collect();
        assert!(!keys.contains(&FieldKey::ServerAddr));
        assert!(!keys.contains(&FieldKey::ApiServerAddr));
        assert!(!keys.contains(&FieldKey::SslSupport));
    }

    #[test]
    fn test_required_fields_have_no_default() {
        for version in ProtocolVersion::ALL {
            for spec in Workflow::for_version(version).fields() {
                if matches!(
                    spec.key,
                    FieldKey::Ssid | FieldKey::Password | FieldKey::Model | FieldKey::UserId
                ) {
                    assert_eq!(spec.default, Required, "{version} {}", spec.key);
                }
            }
        }
    }

    #[test]
    fn test_only_reconfig_skips_the_device() {
        for version in [
            ProtocolVersion::V1,
            ProtocolVersion::V2,
            ProtocolVersion::V3,
            ProtocolVersion::V4,
        ] {
            assert!(Workflow::for_version(version).uses_device(), "{version}");
        }
        assert!(!Workflow::for_version(ProtocolVersion::Reconfig).uses_device());
    }

    #[test]
    fn test_reconfig_never_touches_the_device() {
        assert!(!RECONFIG.uses_device());
        assert!(RECONFIG.record.is_none());
        assert!(!RECONFIG.steps.contains(&Step::CloseDevice));
    }

    #[test]
    fn test_record_shape_build_dispatches() {
        let values = FieldValues::new();
        assert!(matches!(RecordShape::Legacy.build(&values), DeviceRecord::Legacy(_)));
        assert!(matches!(RecordShape::Extended.build(&values), DeviceRecord::Extended(_)));
    }
}
