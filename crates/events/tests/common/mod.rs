#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use garage_core::clock::FixedClock;
use garage_core::paths::{DocumentPath, USERS};
use garage_core::types::Timestamp;
use garage_db::{ChangeOutbox, MemoryStore, StoreError};
use garage_events::delivery::{PushBackend, PushError, PushGateway, PushMessage};
use garage_events::recipients::RecipientResolver;
use garage_events::triggers::{self, Delivery, Trigger, TriggerContext};
use garage_events::DocumentChange;
use serde_json::json;

/// Push backend that records every message it is asked to send.
///
/// Tokens listed in `invalid` fail with [`PushError::InvalidToken`].
#[derive(Default)]
pub struct RecordingBackend {
    sent: Mutex<Vec<PushMessage>>,
    invalid: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn reject_token(&self, token: &str) {
        self.invalid.lock().unwrap().push(token.to_string());
    }

    pub fn sent(&self) -> Vec<PushMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Tokens of the recorded messages, sorted.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.sent().into_iter().map(|m| m.token).collect();
        tokens.sort();
        tokens
    }
}

#[async_trait]
impl PushBackend for RecordingBackend {
    async fn send(&self, message: &PushMessage) -> Result<String, PushError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.invalid.lock().unwrap().contains(&message.token) {
            return Err(PushError::InvalidToken);
        }
        Ok(format!("projects/garage/messages/{}", self.sent.lock().unwrap().len()))
    }
}

/// Outbox that remembers which change ids were completed.
#[derive(Default)]
pub struct RecordingOutbox {
    completed: Mutex<Vec<i64>>,
}

impl RecordingOutbox {
    pub fn completed(&self) -> Vec<i64> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChangeOutbox for RecordingOutbox {
    async fn complete(&self, id: i64) -> Result<(), StoreError> {
        self.completed.lock().unwrap().push(id);
        Ok(())
    }
}

/// 16 October 2026, 10:00 UTC.
pub fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 10, 16, 10, 0, 0).unwrap()
}

/// Store, recording backend and a frozen clock wired into handlers.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub backend: Arc<RecordingBackend>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    /// A harness whose local hour is noon.
    pub fn new() -> Self {
        Self::at_hour(12)
    }

    pub fn at_hour(hour: u8) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            backend: Arc::new(RecordingBackend::default()),
            clock: Arc::new(FixedClock::new(now(), hour)),
        }
    }

    pub fn gateway(&self) -> PushGateway {
        PushGateway::new(self.backend.clone(), self.clock.clone())
    }

    pub fn context(&self) -> TriggerContext {
        let resolver = RecipientResolver::new(self.store.clone(), self.clock.clone());
        TriggerContext::new(self.store.clone(), resolver, self.gateway())
    }

    pub fn put(&self, path: &str, data: serde_json::Value) {
        self.store.put(&DocumentPath::parse(path).unwrap(), data);
    }

    /// A user with token `tok-{uid}` and the given settings.
    pub fn user(&self, uid: &str, settings: serde_json::Value) {
        self.user_doc(uid, json!({ "notificationSettings": settings }));
    }

    /// A user document with token, display name and the given extra fields.
    pub fn user_doc(&self, uid: &str, extra: serde_json::Value) {
        let mut doc = json!({
            "displayName": display_name(uid),
            "fcmToken": format!("tok-{uid}"),
        });
        if let (Some(doc), Some(extra)) = (doc.as_object_mut(), extra.as_object()) {
            doc.extend(extra.clone());
        }
        self.store.put(&DocumentPath::top_level(USERS, uid), doc);
    }

    /// A user document that cannot be read as a profile.
    pub fn broken_user(&self, uid: &str) {
        self.user_doc(uid, json!({ "friends": "nikdo", "notificationSettings": settings_with(&["eventComments", "eventChanges", "eventParticipation", "friendRequests"]) }));
    }

    /// Route `change` like the dispatcher does and run its handlers inline.
    pub async fn fire(&self, change: DocumentChange) -> Delivery {
        let trigger = Trigger::route(&change).expect("change should match a trigger");
        triggers::handle(&self.context(), trigger, &change)
            .await
            .expect("handler should succeed")
    }
}

/// Settings with the master switch and the named flags on.
pub fn settings_with(flags: &[&str]) -> serde_json::Value {
    let mut settings = json!({ "enabled": true });
    for flag in flags {
        settings[*flag] = json!(true);
    }
    settings
}

pub fn display_name(uid: &str) -> String {
    format!("Jezdec {uid}")
}

pub fn created(path: &str, data: serde_json::Value) -> DocumentChange {
    DocumentChange::created(DocumentPath::parse(path).unwrap(), data)
}

pub fn updated(path: &str, before: serde_json::Value, after: serde_json::Value) -> DocumentChange {
    DocumentChange::updated(DocumentPath::parse(path).unwrap(), before, after)
}
