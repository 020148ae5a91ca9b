//! Push delivery for user notifications.
//!
//! [`PushGateway`] is the only way handlers reach a device. It applies the
//! token and quiet-hours gates, hands the message to a [`PushBackend`] and
//! turns every outcome into a plain `bool`. Backend errors are logged here
//! and never escape.

pub mod fcm;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use garage_core::channels::bypasses_quiet_hours;
use garage_core::clock::Clock;
use garage_core::quiet_hours::QuietHours;
use serde::{Deserialize, Serialize};

/// Number of trailing token characters that may appear in logs.
const TOKEN_LOG_SUFFIX: usize = 8;

// ---------------------------------------------------------------------------
// PushMessage
// ---------------------------------------------------------------------------

/// Visible part of a push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

/// A single-target push message.
///
/// Serializes to the wire contract shared with the mobile client:
/// `{token, notification: {title, body}, data: {type, ...}, channelId}`.
/// Every `data` value is a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub token: String,
    pub notification: PushNotification,
    pub data: BTreeMap<String, String>,
    pub channel_id: String,
}

impl PushMessage {
    /// Start a message of data type `kind` on `channel_id`.
    pub fn new(
        token: impl Into<String>,
        channel_id: &str,
        kind: &str,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let mut data = BTreeMap::new();
        data.insert("type".to_string(), kind.to_string());
        Self {
            token: token.into(),
            notification: PushNotification {
                title: title.into(),
                body: body.into(),
            },
            data,
            channel_id: channel_id.to_string(),
        }
    }

    /// Add a `data` entry.
    pub fn with_data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// The `data.type` discriminant.
    pub fn kind(&self) -> &str {
        self.data.get("type").map(String::as_str).unwrap_or_default()
    }
}

/// Trailing characters of a device token, safe to log.
pub fn token_suffix(token: &str) -> &str {
    let start = token
        .char_indices()
        .rev()
        .nth(TOKEN_LOG_SUFFIX - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &token[start..]
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a failed push attempt.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The token is unregistered or belongs to another sender. Permanent.
    #[error("Device token is no longer valid")]
    InvalidToken,

    /// The push service refused the message.
    #[error("Push service returned HTTP {status} ({code})")]
    Rejected { status: u16, code: String },

    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// No access token could be obtained for the push service.
    #[error("Push service authentication failed: {0}")]
    Auth(#[from] gcp_auth::Error),
}

impl PushError {
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidToken)
    }
}

// ---------------------------------------------------------------------------
// PushBackend
// ---------------------------------------------------------------------------

/// A push-messaging service able to deliver one message to one device.
#[async_trait]
pub trait PushBackend: Send + Sync {
    /// Send `message`, returning the service's message id.
    async fn send(&self, message: &PushMessage) -> Result<String, PushError>;
}

// ---------------------------------------------------------------------------
// PushGateway
// ---------------------------------------------------------------------------

/// Gatekeeper in front of the push backend.
#[derive(Clone)]
pub struct PushGateway {
    backend: Arc<dyn PushBackend>,
    clock: Arc<dyn Clock>,
}

impl PushGateway {
    pub fn new(backend: Arc<dyn PushBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Deliver `message` unless a gate stops it.
    ///
    /// Returns `true` only when the backend confirmed the send. An empty
    /// token, an active quiet-hours window (except on the alerts channel) or
    /// any backend failure yields `false`. One attempt, no retry.
    pub async fn send(&self, message: &PushMessage, quiet_hours: Option<&QuietHours>) -> bool {
        if message.token.is_empty() {
            tracing::debug!(kind = message.kind(), "No device token, push skipped");
            return false;
        }

        let token = token_suffix(&message.token);
        let channel = message.channel_id.as_str();

        if !bypasses_quiet_hours(channel) {
            let hour = self.clock.local_hour();
            if quiet_hours.is_some_and(|quiet| quiet.is_active_at(hour)) {
                tracing::info!(token, channel, kind = message.kind(), hour, "Quiet hours, push suppressed");
                return false;
            }
        }

        match self.backend.send(message).await {
            Ok(message_id) => {
                tracing::info!(token, channel, kind = message.kind(), message_id = %message_id, "Push sent");
                true
            }
            Err(e) if e.is_invalid_token() => {
                tracing::warn!(token, channel, kind = message.kind(), "Push rejected, invalid device token");
                false
            }
            Err(e) => {
                tracing::error!(token, channel, kind = message.kind(), error = %e, "Push delivery failed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
