//! Firebase Cloud Messaging (HTTP v1) push backend.
//!
//! [`FcmBackend`] posts one message per request to
//! `{endpoint}/v1/projects/{project}/messages:send`, authenticated with an
//! OAuth2 bearer token from the ambient Google credentials (service account
//! file, `gcloud` user, or the metadata server).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use garage_core::CoreError;
use gcp_auth::TokenProvider;
use serde::Deserialize;

use super::{PushBackend, PushError, PushMessage};

/// OAuth2 scope required by the FCM send API.
const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Default API base URL.
const DEFAULT_ENDPOINT: &str = "https://fcm.googleapis.com";

/// Default timeout for a single send request.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Notification sound requested on iOS devices.
const APNS_SOUND: &str = "default";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// FCM connection settings.
#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// Firebase project id. When `None`, taken from the credentials.
    pub project_id: Option<String>,
    /// API base URL, without trailing slash.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl FcmConfig {
    /// Load FCM settings from environment variables.
    ///
    /// | Env var             | Default                      |
    /// |---------------------|------------------------------|
    /// | `FCM_PROJECT_ID`    | project of the credentials   |
    /// | `FCM_ENDPOINT`      | `https://fcm.googleapis.com` |
    /// | `PUSH_TIMEOUT_SECS` | `10`                         |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load FCM settings through `lookup`, which maps a variable name to
    /// its value. A timeout that is not a whole number of seconds is
    /// rejected.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let project_id = lookup("FCM_PROJECT_ID").filter(|id| !id.is_empty());
        let endpoint = lookup("FCM_ENDPOINT")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.into())
            .trim_end_matches('/')
            .to_string();
        let timeout_secs = match lookup("PUSH_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                CoreError::Validation(format!("PUSH_TIMEOUT_SECS must be a valid number, got '{value}'"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            project_id,
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    fn send_url_for(&self, project_id: &str) -> String {
        format!("{}/v1/projects/{project_id}/messages:send", self.endpoint)
    }
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

// ---------------------------------------------------------------------------
// FcmBackend
// ---------------------------------------------------------------------------

/// Sends push messages through FCM HTTP v1.
pub struct FcmBackend {
    client: reqwest::Client,
    auth: Arc<dyn TokenProvider>,
    send_url: String,
}

impl FcmBackend {
    /// Resolve credentials and build the HTTP client.
    pub async fn new(config: &FcmConfig) -> Result<Self, PushError> {
        let auth = gcp_auth::provider().await?;
        Self::with_provider(config, auth).await
    }

    /// Build a backend around an already constructed token provider.
    pub async fn with_provider(
        config: &FcmConfig,
        auth: Arc<dyn TokenProvider>,
    ) -> Result<Self, PushError> {
        let project_id = match &config.project_id {
            Some(id) => id.clone(),
            None => auth.project_id().await?.to_string(),
        };
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        tracing::info!(project_id = %project_id, endpoint = %config.endpoint, "FCM backend ready");

        Ok(Self {
            client,
            auth,
            send_url: config.send_url_for(&project_id),
        })
    }
}

#[async_trait]
impl PushBackend for FcmBackend {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        let bearer = self.auth.token(&[FCM_SCOPE]).await?;

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(bearer.as_str())
            .json(&envelope(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let sent: SendResponse = response.json().await?;
            return Ok(sent.name);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status.as_u16(), &body))
    }
}

/// Wrap a message in the FCM v1 request body.
///
/// The channel id goes to the Android notification block, and iOS gets the
/// default sound so both platforms behave alike.
pub fn envelope(message: &PushMessage) -> serde_json::Value {
    serde_json::json!({
        "message": {
            "token": message.token,
            "notification": {
                "title": message.notification.title,
                "body": message.notification.body,
            },
            "data": message.data,
            "android": {
                "notification": { "channel_id": message.channel_id },
            },
            "apns": {
                "payload": { "aps": { "sound": APNS_SOUND } },
            },
        }
    })
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: ErrorStatus,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "errorCode")]
    error_code: Option<String>,
}

/// Map a non-2xx FCM response to a [`PushError`].
///
/// `UNREGISTERED`, `SENDER_ID_MISMATCH`, a 404, and an `INVALID_ARGUMENT`
/// about the registration token all mean the token will never work again.
pub fn classify_failure(status: u16, body: &str) -> PushError {
    let parsed: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
    let error = parsed.error;

    let code = error
        .details
        .iter()
        .find_map(|d| d.error_code.clone())
        .filter(|c| !c.is_empty())
        .or_else(|| Some(error.status.clone()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "UNKNOWN".to_string());

    let invalid_token = status == 404
        || code == "UNREGISTERED"
        || code == "SENDER_ID_MISMATCH"
        || (code == "INVALID_ARGUMENT" && error.message.contains("registration token"));

    if invalid_token {
        PushError::InvalidToken
    } else {
        PushError::Rejected { status, code }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn fcm_error(status: u16, grpc: &str, code: Option<&str>, message: &str) -> String {
        let details = match code {
            Some(code) => serde_json::json!([{
                "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                "errorCode": code
            }]),
            None => serde_json::json!([]),
        };
        serde_json::json!({
            "error": { "code": status, "message": message, "status": grpc, "details": details }
        })
        .to_string()
    }

    #[test]
    fn unregistered_token_is_invalid() {
        let body = fcm_error(404, "NOT_FOUND", Some("UNREGISTERED"), "Requested entity was not found.");
        assert_matches!(classify_failure(404, &body), PushError::InvalidToken);
    }

    #[test]
    fn sender_id_mismatch_is_invalid() {
        let body = fcm_error(403, "PERMISSION_DENIED", Some("SENDER_ID_MISMATCH"), "SenderId mismatch");
        assert_matches!(classify_failure(403, &body), PushError::InvalidToken);
    }

    #[test]
    fn malformed_registration_token_is_invalid() {
        let body = fcm_error(
            400,
            "INVALID_ARGUMENT",
            Some("INVALID_ARGUMENT"),
            "The registration token is not a valid FCM registration token",
        );
        assert_matches!(classify_failure(400, &body), PushError::InvalidToken);
    }

    #[test]
    fn other_invalid_argument_is_a_rejection() {
        let body = fcm_error(400, "INVALID_ARGUMENT", None, "Invalid JSON payload received.");
        assert_matches!(
            classify_failure(400, &body),
            PushError::Rejected { status: 400, ref code } if code == "INVALID_ARGUMENT"
        );
    }

    #[test]
    fn quota_exceeded_is_a_rejection() {
        let body = fcm_error(429, "RESOURCE_EXHAUSTED", Some("QUOTA_EXCEEDED"), "Quota exceeded");
        assert_matches!(
            classify_failure(429, &body),
            PushError::Rejected { status: 429, ref code } if code == "QUOTA_EXCEEDED"
        );
    }

    #[test]
    fn unparseable_body_is_a_rejection() {
        assert_matches!(
            classify_failure(502, "<html>Bad Gateway</html>"),
            PushError::Rejected { status: 502, ref code } if code == "UNKNOWN"
        );
    }

    #[test]
    fn envelope_carries_channel_and_data() {
        let message = PushMessage::new("tok-1", "alerts", "sos_beacon", "🆘 SOS", "Píchlá guma")
            .with_data("beaconId", "b1");
        let body = envelope(&message);

        assert_eq!(body["message"]["token"], "tok-1");
        assert_eq!(body["message"]["notification"]["title"], "🆘 SOS");
        assert_eq!(body["message"]["data"]["type"], "sos_beacon");
        assert_eq!(body["message"]["data"]["beaconId"], "b1");
        assert_eq!(body["message"]["android"]["notification"]["channel_id"], "alerts");
        assert_eq!(body["message"]["apns"]["payload"]["aps"]["sound"], "default");
    }

    #[test]
    fn config_from_lookup_trims_endpoint() {
        let config = FcmConfig::from_lookup(|key| match key {
            "FCM_PROJECT_ID" => Some("garage-app".into()),
            "FCM_ENDPOINT" => Some("http://localhost:9099/".into()),
            "PUSH_TIMEOUT_SECS" => Some("3".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.project_id.as_deref(), Some("garage-app"));
        assert_eq!(config.send_url_for("garage-app"), "http://localhost:9099/v1/projects/garage-app/messages:send");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn malformed_timeout_is_rejected() {
        let result = FcmConfig::from_lookup(|key| match key {
            "PUSH_TIMEOUT_SECS" => Some("ten".into()),
            _ => None,
        });
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn default_config_points_at_google() {
        let config = FcmConfig::default();
        assert_eq!(config.endpoint, "https://fcm.googleapis.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.project_id.is_none());
    }
}
