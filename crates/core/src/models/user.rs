use serde::{Deserialize, Serialize};

use super::{null_default, Document};
use crate::settings::NotificationSettings;
use crate::types::DocId;

/// A `users/{uid}` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(skip)]
    pub uid: DocId,
    /// Device push token. Absent means the user cannot be notified.
    pub fcm_token: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub display_name: String,
    #[serde(deserialize_with = "null_default")]
    pub notification_settings: NotificationSettings,
    #[serde(deserialize_with = "null_default")]
    pub friends: Vec<DocId>,
    #[serde(deserialize_with = "null_default")]
    pub badges: Vec<Badge>,
}

/// An earned badge. Only the id matters for notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
}

impl UserProfile {
    /// The push token, treating an empty string the same as a missing one.
    pub fn push_token(&self) -> Option<&str> {
        self.fcm_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl Document for UserProfile {
    fn set_id(&mut self, id: &str) {
        self.uid = id.to_string();
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::decode;

    #[test]
    fn decodes_sparse_document_with_defaults() {
        let user: UserProfile = decode("u1", json!({ "displayName": "Petr" })).unwrap();
        assert_eq!(user.uid, "u1");
        assert_eq!(user.display_name, "Petr");
        assert!(user.push_token().is_none());
        assert!(!user.notification_settings.enabled);
        assert!(user.friends.is_empty());
    }

    #[test]
    fn null_fields_fall_back_to_defaults() {
        let user: UserProfile = decode(
            "u1",
            json!({
                "fcmToken": null,
                "displayName": null,
                "friends": null,
                "notificationSettings": null
            }),
        )
        .unwrap();
        assert!(user.fcm_token.is_none());
        assert_eq!(user.display_name, "");
        assert!(user.friends.is_empty());
    }

    #[test]
    fn empty_token_is_not_a_token() {
        let user = UserProfile {
            fcm_token: Some(String::new()),
            ..Default::default()
        };
        assert!(user.push_token().is_none());
    }

    #[test]
    fn badges_ignore_extra_fields() {
        let user: UserProfile = decode(
            "u1",
            json!({ "badges": [{ "id": "first_car", "earnedAt": "2026-01-01T00:00:00Z" }] }),
        )
        .unwrap();
        assert_eq!(user.badges, vec![Badge { id: "first_car".into() }]);
    }
}
