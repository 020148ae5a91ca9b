//! Recipient resolution: who can be notified, and with which token.

use std::sync::Arc;

use garage_core::clock::Clock;
use garage_core::models::{EventType, UserProfile};
use garage_core::quiet_hours::QuietHours;
use garage_core::settings::{Category, NotificationSettings};
use garage_core::types::DocId;
use garage_db::{DocumentStore, StoreError};

/// A user that passed every gate for a category and has a device token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub uid: DocId,
    pub token: String,
    pub display_name: String,
    pub quiet_hours: QuietHours,
}

impl Recipient {
    fn from_profile(profile: &UserProfile) -> Option<Self> {
        let token = profile.push_token()?;
        Some(Self {
            uid: profile.uid.clone(),
            token: token.to_string(),
            display_name: profile.display_name.clone(),
            quiet_hours: profile.notification_settings.quiet_hours,
        })
    }
}

/// Result of a point lookup. All fields are `None` when the user document
/// does not exist, which callers treat as "cannot notify".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedUser {
    pub token: Option<String>,
    pub display_name: Option<String>,
    pub settings: Option<NotificationSettings>,
}

impl ResolvedUser {
    /// The user as a recipient for `category`, if their settings allow it
    /// and they have a device token.
    ///
    /// Quiet hours are not checked here; the gateway does that.
    pub fn recipient(&self, uid: &str, category: Category) -> Option<Recipient> {
        let settings = self.settings.as_ref()?;
        if !settings.allows(category) {
            return None;
        }
        Some(Recipient {
            uid: uid.to_string(),
            token: self.token.clone()?,
            display_name: self.display_name.clone().unwrap_or_default(),
            quiet_hours: settings.quiet_hours,
        })
    }
}

impl From<UserProfile> for ResolvedUser {
    fn from(profile: UserProfile) -> Self {
        Self {
            token: profile.push_token().map(str::to_string),
            display_name: Some(profile.display_name),
            settings: Some(profile.notification_settings),
        }
    }
}

/// Looks users up in the document store and applies the opt-in gates.
#[derive(Clone)]
pub struct RecipientResolver {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl RecipientResolver {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Every user opted in to `category` who has a token and is not inside
    /// their quiet hours right now.
    ///
    /// The quiet-hours pre-filter runs for every category, `sosAlerts`
    /// included, even though the gateway would let alerts through.
    pub async fn by_category(&self, category: Category) -> Result<Vec<Recipient>, StoreError> {
        let hour = self.clock.local_hour();
        let users = self.store.list_users().await?;
        let total = users.len();

        let recipients: Vec<Recipient> = users
            .iter()
            .filter(|user| {
                let settings = &user.notification_settings;
                settings.allows(category) && !settings.is_quiet_at(hour)
            })
            .filter_map(Recipient::from_profile)
            .collect();

        tracing::debug!(%category, scanned = total, matched = recipients.len(), "Resolved recipients");
        Ok(recipients)
    }

    /// Point lookup of one user.
    pub async fn single(&self, uid: &str) -> Result<ResolvedUser, StoreError> {
        Ok(self
            .store
            .get_user(uid)
            .await?
            .map(ResolvedUser::from)
            .unwrap_or_default())
    }

    /// Subscribers to new events of `event_type`, excluding the creator.
    pub async fn for_new_event(
        &self,
        event_type: EventType,
        creator_id: &str,
    ) -> Result<Vec<Recipient>, StoreError> {
        let users = self.store.list_users_subscribed_to_new_events().await?;
        Ok(users
            .iter()
            .filter(|user| user.uid != creator_id)
            .filter(|user| user.notification_settings.wants_new_event(event_type))
            .filter_map(Recipient::from_profile)
            .collect())
    }
}
