//! Interpreter for the per-version step tables.
//!
//! [`execute`] walks a [`Workflow`] once, in order, against a [`Session`].
//! Per-run state (the device MAC, collected fields, the issued credentials
//! and the backend replies) lives in a [`RunState`] that is created fresh for
//! every run, so nothing leaks between sessions.
//!
//! # Value resolution (for beginners)
//!
//! - The MAC sent to the backend is the `mac` field when the workflow asked
//!   for one, otherwise whatever the device greeting reported.
//! - The key sent to the backend is the `mqtt_key` field when the workflow
//!   asked for one (V1 lets the operator override it), otherwise the issued
//!   key.
//! - The verify value recorded with the backend is always the one returned
//!   by the issuance endpoint, not the one that was sent.

use powercfg_core::domain::defaults;
use powercfg_core::{
    ConnectApRequest, DelayMessage, DeviceRecord, FieldKey, FieldValues, MqttAuth,
    MqttAuthRequest, BUTTON_PREFIX,
};
use tracing::{debug, info, warn};

use super::error::ProvisionError;
use super::ports::{AuthError, AuthService, Console, DeviceError, DeviceLink};
use super::workflow::{FieldDefault, FieldSpec, Step, VerifySource, Workflow};
use crate::domain::SessionConfig;

/// Prompt shown after the device is closed and before any backend call.
pub const NETWORK_RESTORE_PROMPT: &str = "Restore the network connection, then press Enter: ";

/// Everything a session needs: its settings and its three ports.
pub struct Session {
    pub config: SessionConfig,
    pub auth: Box<dyn AuthService>,
    pub device: Option<Box<dyn DeviceLink>>,
    pub console: Box<dyn Console>,
}

impl Session {
    fn device(&mut self, workflow: &Workflow) -> Result<&mut Box<dyn DeviceLink>, ProvisionError> {
        self.device
            .as_mut()
            .ok_or(ProvisionError::DeviceUnavailable(workflow.version.as_str()))
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    /// MAC used for the backend calls.
    pub mac: String,
    /// Key recorded with the backend.
    pub mqtt_key: String,
    /// Record pushed to the device, for device-phase workflows.
    pub record: Option<DeviceRecord>,
    /// Raw reply of the auth-addition call.
    pub auth_add_response: String,
    /// Raw reply of the key-update call; `None` when the operator skipped it.
    pub key_update_response: Option<String>,
}

#[derive(Debug, Default)]
struct RunState {
    device_mac: String,
    values: FieldValues,
    issued: Option<MqttAuth>,
    record: Option<DeviceRecord>,
    auth_add_response: Option<String>,
    key_update_response: Option<String>,
}

impl RunState {
    fn mac(&self) -> &str {
        self.values.get_or(FieldKey::Mac, &self.device_mac)
    }

    fn issued(&self) -> Result<&MqttAuth, ProvisionError> {
        self.issued.as_ref().ok_or_else(|| {
            AuthError::Issuance("no credentials have been issued in this session".to_string())
                .into()
        })
    }

    fn mqtt_key(&self) -> Result<&str, ProvisionError> {
        match self.values.get(FieldKey::MqttKey) {
            Some(key) => Ok(key),
            None => Ok(self.issued()?.mqtt_key.as_str()),
        }
    }
}

/// Runs `workflow` to completion against `session`.
///
/// Stops at the first failing step; later steps are never attempted.  The
/// caller is responsible for closing the device afterwards.
pub async fn execute(
    workflow: &Workflow,
    session: &mut Session,
) -> Result<ProvisionOutcome, ProvisionError> {
    let mut state = RunState::default();

    for step in workflow.steps {
        debug!(version = %workflow.version, ?step, "running step");
        run_step(workflow, *step, session, &mut state).await?;
    }

    let mac = state.mac().to_string();
    let mqtt_key = state.mqtt_key()?.to_string();
    Ok(ProvisionOutcome {
        mac,
        mqtt_key,
        record: state.record,
        auth_add_response: state.auth_add_response.unwrap_or_default(),
        key_update_response: state.key_update_response,
    })
}

async fn run_step(
    workflow: &Workflow,
    step: Step,
    session: &mut Session,
    state: &mut RunState,
) -> Result<(), ProvisionError> {
    match step {
        Step::Handshake => {
            let Session { device, console, .. } = session;
            let device = device
                .as_mut()
                .ok_or(ProvisionError::DeviceUnavailable(workflow.version.as_str()))?;
            device.send_start_message().await?;
            device.send_hello_message().await?;
            let mac = device.receive_device_mac(console.as_mut()).await?;
            if mac.is_empty() {
                warn!("device greeting carried no MAC; continuing with an empty default");
            } else {
                info!(%mac, "device identified");
            }
            state.device_mac = mac;
        }

        Step::Collect(fields) => {
            for spec in fields {
                let value = prompt_field(
                    session.console.as_mut(),
                    spec,
                    &state.device_mac,
                    state.issued.as_ref(),
                )
                .await?;
                state.values.insert(spec.key, value);
            }
        }

        Step::IssueCredentials => {
            let coordinates = match workflow.record {
                Some(shape) => {
                    let record = shape.build(&state.values);
                    let (lati, long) = record.coordinates();
                    (lati.to_string(), long.to_string())
                }
                None => (
                    defaults::UNKNOWN_COORDINATE.to_string(),
                    defaults::UNKNOWN_COORDINATE.to_string(),
                ),
            };
            let verify = match workflow.verify {
                VerifySource::Fixed(value) => value,
                VerifySource::Field(key) => state.values.get_or(key, defaults::CONFIRM),
            };
            let request = MqttAuthRequest::new(
                state.values.get_or(FieldKey::UserId, ""),
                state.mac(),
                state.values.get_or(FieldKey::Model, ""),
                (coordinates.0.as_str(), coordinates.1.as_str()),
                verify,
            );

            info!(mac = %request.device.mac, verify = %request.device.verify, "requesting MQTT credentials");
            let issued = session
                .auth
                .issue_credentials(&session.config, &request)
                .await?;
            session
                .console
                .write_line(&format!("mqtt_key: {}", issued.mqtt_key))
                .await?;
            state.issued = Some(issued);
        }

        Step::PushConfiguration => {
            let shape = workflow.record.ok_or(ProvisionError::DeviceUnavailable(
                workflow.version.as_str(),
            ))?;
            let record = shape.build(&state.values);
            let json = serde_json::to_string(&record).map_err(DeviceError::from)?;
            session.console.write_line(&format!("Push: {json}")).await?;

            let written = session.device(workflow)?.push_configuration(&record).await?;
            session
                .console
                .write_line(&format!("Send: {written} Byte."))
                .await?;
            state.record = Some(record);
        }

        Step::RelayStatus => {
            let message = session.device(workflow)?.receive_message().await?;
            session.console.write_line(&message).await?;
        }

        Step::AwaitButtonRelease => loop {
            let message = session.device(workflow)?.receive_message().await?;
            session.console.write_line(&message).await?;
            if !message.trim_start().starts_with(BUTTON_PREFIX) {
                break;
            }
            debug!("device is waiting for its button");
        },

        Step::SendDelay => {
            session
                .device(workflow)?
                .send_delay_message(&DelayMessage::default())
                .await?;
        }

        Step::SendConnectAp => {
            let request = ConnectApRequest::new(state.mac());
            session
                .device(workflow)?
                .send_connect_ap_request(&request)
                .await?;
        }

        Step::CloseDevice => {
            session.device(workflow)?.close().await;
            info!("device connection closed");
        }

        Step::AwaitNetwork => {
            session.console.write(NETWORK_RESTORE_PROMPT).await?;
            session.console.read_line().await?;
        }

        Step::RecordAddition => {
            let issued = state.issued()?;
            let response = session
                .auth
                .record_auth_addition(
                    &session.config,
                    state.values.get_or(FieldKey::UserId, ""),
                    state.mac(),
                    &issued.verify,
                    state.mqtt_key()?,
                )
                .await?;
            session.console.write_line(&response).await?;
            state.auth_add_response = Some(response);
        }

        Step::UpdateKey => {
            let skip = state
                .values
                .get(FieldKey::UpdateKey)
                .is_some_and(|answer| answer.trim().eq_ignore_ascii_case("false"));
            if skip {
                info!("key update skipped by operator");
                return Ok(());
            }

            let response = session
                .auth
                .update_device_key(
                    &session.config,
                    state.mac(),
                    state.mqtt_key()?,
                    session.config.client_certificate(),
                )
                .await?;
            session.console.write_line(&response).await?;
            state.key_update_response = Some(response);
        }
    }
    Ok(())
}

/// Asks for one field and applies its default.
///
/// A blank answer (empty, whitespace only, or end of input) takes the
/// default; a required field answered blank is a [`ProvisionError::MissingField`].
async fn prompt_field(
    console: &mut dyn Console,
    spec: &FieldSpec,
    device_mac: &str,
    issued: Option<&MqttAuth>,
) -> Result<String, ProvisionError> {
    let default = match spec.default {
        FieldDefault::Required => None,
        FieldDefault::Literal(value) => Some(value.to_string()),
        FieldDefault::DeviceMac => Some(device_mac.to_string()),
        FieldDefault::IssuedKey => issued.map(|auth| auth.mqtt_key.clone()),
    };

    let prompt = match &default {
        Some(value) => format!("{} (default: {value}) : ", spec.label),
        None => format!("{} : ", spec.label),
    };
    console.write(&prompt).await?;

    match console.read_line().await? {
        Some(answer) if !answer.trim().is_empty() => Ok(answer),
        _ => default.ok_or(ProvisionError::MissingField { field: spec.key }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockAuthService;
    use async_trait::async_trait;
    use powercfg_core::ProtocolVersion;
    use std::collections::VecDeque;

    /// Console fed from a fixed list of answers; output is captured.
    #[derive(Default)]
    struct ScriptedConsole {
        answers: VecDeque<String>,
        output: String,
    }

    impl ScriptedConsole {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                output: String::new(),
            }
        }
    }

    #[async_trait]
    impl Console for ScriptedConsole {
        async fn read_line(&mut self) -> std::io::Result<Option<String>> {
            Ok(self.answers.pop_front())
        }
        async fn write(&mut self, text: &str) -> std::io::Result<()> {
            self.output.push_str(text);
            Ok(())
        }
        async fn write_line(&mut self, text: &str) -> std::io::Result<()> {
            self.output.push_str(text);
            self.output.push('\n');
            Ok(())
        }
    }

    fn make_config() -> SessionConfig {
        SessionConfig::new("127.0.0.1".parse().unwrap(), 5000, "https://backend:8443")
    }

    fn make_session(auth: MockAuthService, answers: &[&str]) -> Session {
        Session {
            config: make_config(),
            auth: Box::new(auth),
            device: None,
            console: Box::new(ScriptedConsole::new(answers)),
        }
    }

    fn spec(default: FieldDefault) -> FieldSpec {
        FieldSpec {
            key: FieldKey::Topic,
            label: "Mqtt Topic",
            default,
        }
    }

    #[tokio::test]
    async fn test_prompt_field_blank_answer_takes_literal_default() {
        let mut console = ScriptedConsole::new(&["   "]);
        let value = prompt_field(&mut console, &spec(FieldDefault::Literal("dwd")), "", None)
            .await
            .unwrap();
        assert_eq!(value, "dwd");
        assert_eq!(console.output, "Mqtt Topic (default: dwd) : ");
    }

    #[tokio::test]
    async fn test_prompt_field_end_of_input_counts_as_blank() {
        let mut console = ScriptedConsole::new(&[]);
        let value = prompt_field(&mut console, &spec(FieldDefault::DeviceMac), "AABBCC", None)
            .await
            .unwrap();
        assert_eq!(value, "AABBCC");
    }

    #[tokio::test]
    async fn test_prompt_field_required_blank_is_missing_field() {
        let mut console = ScriptedConsole::new(&[""]);
        let err = prompt_field(&mut console, &spec(FieldDefault::Required), "", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::MissingField {
                field: FieldKey::Topic
            }
        ));
    }

    #[tokio::test]
    async fn test_prompt_field_keeps_typed_value() {
        let mut console = ScriptedConsole::new(&["custom"]);
        let value = prompt_field(&mut console, &spec(FieldDefault::Literal("dwd")), "", None)
            .await
            .unwrap();
        assert_eq!(value, "custom");
    }

    #[tokio::test]
    async fn test_prompt_field_issued_key_default() {
        let issued = MqttAuth {
            verify: "false".to_string(),
            mqtt_key: "minted".to_string(),
        };
        let mut console = ScriptedConsole::new(&[""]);
        let value = prompt_field(
            &mut console,
            &spec(FieldDefault::IssuedKey),
            "",
            Some(&issued),
        )
        .await
        .unwrap();
        assert_eq!(value, "minted");
    }

    #[tokio::test]
    async fn test_reconfig_issues_records_and_updates() {
        // Arrange
        let mut auth = MockAuthService::new();
        auth.expect_issue_credentials()
            .withf(|_, req| {
                req.account.user_id == "test@outlook.com/kakao"
                    && req.device.mac == "000000"
                    && req.device.model_id == "B550_W"
                    && req.device.verify == "true"
                    && req.device.lati == "0"
                    && req.device.long == "0"
            })
            .times(1)
            .returning(|_, _| {
                Ok(MqttAuth {
                    verify: "verify".to_string(),
                    mqtt_key: "key".to_string(),
                })
            });
        auth.expect_record_auth_addition()
            .withf(|_, user, mac, verify, key| {
                user == "test@outlook.com/kakao"
                    && mac == "000000"
                    && verify == "verify"
                    && key == "key"
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok("added".to_string()));
        auth.expect_update_device_key()
            .withf(|_, mac, key, cert| mac == "000000" && key == "key" && cert.is_none())
            .times(1)
            .returning(|_, _, _, _| Ok("updated".to_string()));
        let mut session = make_session(
            auth,
            &["test@outlook.com/kakao", "000000", "B550_W", "true", "true"],
        );

        // Act
        let outcome = execute(Workflow::for_version(ProtocolVersion::Reconfig), &mut session)
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome.mac, "000000");
        assert_eq!(outcome.mqtt_key, "key");
        assert_eq!(outcome.record, None);
        assert_eq!(outcome.auth_add_response, "added");
        assert_eq!(outcome.key_update_response.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn test_reconfig_blank_verify_defaults_to_true() {
        let mut auth = MockAuthService::new();
        auth.expect_issue_credentials()
            .withf(|_, req| req.device.verify == "true")
            .times(1)
            .returning(|_, _| {
                Ok(MqttAuth {
                    verify: "true".to_string(),
                    mqtt_key: "key".to_string(),
                })
            });
        auth.expect_record_auth_addition()
            .returning(|_, _, _, _, _| Ok("added".to_string()));
        auth.expect_update_device_key()
            .times(1)
            .returning(|_, _, _, _| Ok("updated".to_string()));
        let mut session = make_session(auth, &["u1", "AABBCC", "B550_W", "", ""]);

        let outcome = execute(Workflow::for_version(ProtocolVersion::Reconfig), &mut session)
            .await
            .unwrap();

        assert_eq!(outcome.key_update_response.as_deref(), Some("updated"));
    }

    #[tokio::test]
    async fn test_reconfig_update_can_be_declined() {
        // Arrange: operator answers "false" to the update question
        let mut auth = MockAuthService::new();
        auth.expect_issue_credentials().returning(|_, _| {
            Ok(MqttAuth {
                verify: "false".to_string(),
                mqtt_key: "key".to_string(),
            })
        });
        auth.expect_record_auth_addition()
            .times(1)
            .returning(|_, _, _, _, _| Ok("added".to_string()));
        auth.expect_update_device_key().times(0);
        let mut session = make_session(auth, &["u1", "AABBCC", "B550_W", "false", "false"]);

        // Act
        let outcome = execute(Workflow::for_version(ProtocolVersion::Reconfig), &mut session)
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome.key_update_response, None);
    }

    #[tokio::test]
    async fn test_reconfig_missing_user_id_stops_before_backend() {
        let mut auth = MockAuthService::new();
        auth.expect_issue_credentials().times(0);
        auth.expect_record_auth_addition().times(0);
        auth.expect_update_device_key().times(0);
        let mut session = make_session(auth, &[""]);

        let err = execute(Workflow::for_version(ProtocolVersion::Reconfig), &mut session)
            .await
            .unwrap_err();

        assert_eq!(err.missing_field(), Some("user_id"));
    }

    #[tokio::test]
    async fn test_issuance_failure_stops_the_run() {
        let mut auth = MockAuthService::new();
        auth.expect_issue_credentials()
            .returning(|_, _| Err(AuthError::Issuance("status 500".to_string())));
        auth.expect_record_auth_addition().times(0);
        auth.expect_update_device_key().times(0);
        let mut session = make_session(auth, &["u1", "AABBCC", "B550_W", "", ""]);

        let err = execute(Workflow::for_version(ProtocolVersion::Reconfig), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Auth(AuthError::Issuance(_))));
    }

    #[tokio::test]
    async fn test_device_step_without_device_is_reported() {
        let mut session = make_session(MockAuthService::new(), &[]);

        let err = execute(Workflow::for_version(ProtocolVersion::V3), &mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::DeviceUnavailable("V3")));
    }
}
