//! HTTPS client for the credential backend.
//!
//! Three calls, each on a fresh `reqwest` client so the TLS settings of one
//! call never leak into another:
//!
//! | Call                   | URL                                            | TLS          |
//! |------------------------|------------------------------------------------|--------------|
//! | `issue_credentials`    | fixed issuance host                            | 1.0 to 1.2   |
//! | `record_auth_addition` | `{backend}/api/auth/add`                       | 1.0 to 1.2   |
//! | `update_device_key`    | `{backend}/rest/Auth/update_mqttKey`           | 1.2 only, optional client certificate |
//!
//! No call is retried and none carries a timeout: a slow backend is waited
//! for.  A non-success status, or an issuance reply that is
//! not a valid key document, is an error.  The two backend replies are
//! otherwise returned as raw text.

use async_trait::async_trait;
use powercfg_core::{AddAuthRequest, MqttAuth, MqttAuthRequest, MqttKeyUpdateRequest};
use reqwest::header::ACCEPT;
use reqwest::tls::Version;
use reqwest::{Client, Identity, Response};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::ports::{AuthError, AuthService};
use crate::domain::{ClientCertificate, SessionConfig};

/// Issuance endpoint.  Not derived from the session's backend address.
pub const ISSUANCE_ENDPOINT: &str = "https://dwapi.dawonai.com:18443/api/v1/devices/register/create";

pub const AUTH_ADD_PATH: &str = "/api/auth/add";
pub const KEY_UPDATE_PATH: &str = "/rest/Auth/update_mqttKey";

/// [`AuthService`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpAuthService {
    issuance_endpoint: String,
}

impl Default for HttpAuthService {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAuthService {
    pub fn new() -> Self {
        Self {
            issuance_endpoint: ISSUANCE_ENDPOINT.to_string(),
        }
    }

    /// Points issuance at another host (staging, or a local test server).
    pub fn with_issuance_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.issuance_endpoint = endpoint.into();
        self
    }

    pub fn issuance_endpoint(&self) -> &str {
        &self.issuance_endpoint
    }

    /// Client for the issuance and auth-addition calls.
    fn compat_client() -> Result<Client, reqwest::Error> {
        Client::builder()
            .min_tls_version(Version::TLS_1_0)
            .max_tls_version(Version::TLS_1_2)
            .build()
    }

    /// Client for the key-update call, optionally presenting `certificate`.
    async fn key_update_client(
        certificate: Option<&ClientCertificate>,
    ) -> Result<Client, AuthError> {
        let mut builder = Client::builder()
            .min_tls_version(Version::TLS_1_2)
            .max_tls_version(Version::TLS_1_2);

        if let Some(cert) = certificate {
            let path_text = cert.path.display().to_string();
            let der = tokio::fs::read(&cert.path)
                .await
                .map_err(|e| AuthError::Certificate {
                    path: path_text.clone(),
                    reason: e.to_string(),
                })?;
            let identity = Identity::from_pkcs12_der(&der, &cert.password).map_err(|e| {
                AuthError::Certificate {
                    path: path_text.clone(),
                    reason: e.to_string(),
                }
            })?;
            debug!(path = %path_text, "client certificate loaded");
            builder = builder.identity(identity);
        }

        builder.build().map_err(|e| backend_error(KEY_UPDATE_PATH, e))
    }

    async fn post_json<T: Serialize + ?Sized>(
        client: &Client,
        url: &str,
        body: &T,
    ) -> Result<Response, reqwest::Error> {
        client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
    }
}

fn backend_error(endpoint: &str, reason: impl ToString) -> AuthError {
    AuthError::Backend {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}

/// Returns the body of a successful reply, or a [`AuthError::Backend`].
async fn text_or_error(endpoint: &str, response: Response) -> Result<String, AuthError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| backend_error(endpoint, e))?;
    if !status.is_success() {
        warn!(%endpoint, %status, "backend returned an error status");
        return Err(backend_error(endpoint, format!("status {status}: {body}")));
    }
    Ok(body)
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn issue_credentials(
        &self,
        _config: &SessionConfig,
        request: &MqttAuthRequest,
    ) -> Result<MqttAuth, AuthError> {
        let issuance = |e: reqwest::Error| AuthError::Issuance(e.to_string());
        let client = Self::compat_client().map_err(issuance)?;

        debug!(endpoint = %self.issuance_endpoint, "requesting credentials");
        let response = Self::post_json(&client, &self.issuance_endpoint, request)
            .await
            .map_err(issuance)?;

        let status = response.status();
        let body = response.text().await.map_err(issuance)?;
        if !status.is_success() {
            warn!(%status, "issuance returned an error status");
            return Err(AuthError::Issuance(format!("status {status}: {body}")));
        }

        let auth: MqttAuth = serde_json::from_str(&body)
            .map_err(|e| AuthError::Issuance(format!("malformed reply: {e}")))?;
        info!(verify = %auth.verify, "credentials issued");
        Ok(auth)
    }

    async fn record_auth_addition(
        &self,
        config: &SessionConfig,
        user_id: &str,
        mac: &str,
        verify: &str,
        mqtt_key: &str,
    ) -> Result<String, AuthError> {
        let url = config.backend_url(AUTH_ADD_PATH);
        let body = AddAuthRequest {
            user_id: user_id.to_string(),
            device_id: mac.to_string(),
            verify: verify.to_string(),
            mqtt_key: mqtt_key.to_string(),
        };

        let client = Self::compat_client().map_err(|e| backend_error(&url, e))?;
        let response = Self::post_json(&client, &url, &body)
            .await
            .map_err(|e| backend_error(&url, e))?;
        info!(%url, status = %response.status(), "auth addition recorded");
        text_or_error(&url, response).await
    }

    async fn update_device_key(
        &self,
        config: &SessionConfig,
        mac: &str,
        mqtt_key: &str,
        certificate: Option<ClientCertificate>,
    ) -> Result<String, AuthError> {
        let url = config.backend_url(KEY_UPDATE_PATH);
        let body = MqttKeyUpdateRequest {
            device_id: mac.to_string(),
            mqtt_key: mqtt_key.to_string(),
        };

        let client = Self::key_update_client(certificate.as_ref()).await?;
        let response = Self::post_json(&client, &url, &body)
            .await
            .map_err(|e| backend_error(&url, e))?;
        info!(%url, status = %response.status(), "device key updated");
        text_or_error(&url, response).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
