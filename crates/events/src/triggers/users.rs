//! Handlers on user profile updates: new friends and awarded badges.

use garage_core::badges::badge_info;
use garage_core::channels::CHANNEL_DEFAULT;
use garage_core::diff;
use garage_core::models::UserProfile;
use garage_core::notification_types::{TYPE_BADGE_AWARDED, TYPE_FRIEND_REQUEST};
use garage_core::settings::Category;

use super::{Delivery, Outgoing, TriggerContext, TriggerError};
use crate::bus::DocumentChange;
use crate::recipients::ResolvedUser;

/// Someone added friends to their list; each added friend hears about it.
///
/// The change is on the adder's document, the notification goes to the
/// user who was added.
pub async fn on_friends_added(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let before: UserProfile = change.decode_before()?;
    let after: UserProfile = change.decode_after()?;

    let added = diff::added(&before.friends, &after.friends);
    if added.is_empty() {
        return Ok(Delivery::default());
    }

    let adder = match after.display_name.trim() {
        "" => "Někdo",
        name => name,
    };

    let mut outgoing = Vec::new();
    for friend_id in added.iter().filter(|uid| **uid != after.uid) {
        let Some(friend) = ctx.lookup(friend_id).await else {
            continue;
        };
        if let Some(recipient) = friend.recipient(friend_id, Category::FriendRequests) {
            outgoing.push(
                Outgoing::to(
                    &recipient,
                    CHANNEL_DEFAULT,
                    TYPE_FRIEND_REQUEST,
                    "🤝 Nový přítel",
                    format!("{adder} si tě přidal/a mezi přátele"),
                )
                .with_data("userId", &after.uid),
            );
        }
    }

    Ok(ctx.fan_out("friend_request", outgoing).await)
}

/// Each newly earned badge is announced to its owner.
pub async fn on_badges_awarded(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let before: UserProfile = change.decode_before()?;
    let after: UserProfile = change.decode_after()?;

    let awarded = diff::added_by(&before.badges, &after.badges, |badge| badge.id.clone());
    if awarded.is_empty() {
        return Ok(Delivery::default());
    }

    // The change already carries the owner's current settings and token.
    let owner = ResolvedUser::from(after.clone());
    let Some(recipient) = owner.recipient(&after.uid, Category::BadgeNotifications) else {
        return Ok(Delivery::default());
    };

    let outgoing = awarded
        .iter()
        .map(|badge| {
            let info = badge_info(&badge.id);
            Outgoing::to(
                &recipient,
                CHANNEL_DEFAULT,
                TYPE_BADGE_AWARDED,
                format!("🏆 {}", info.name),
                info.description,
            )
            .with_data("badgeId", &badge.id)
        })
        .collect();

    Ok(ctx.fan_out("badge_awarded", outgoing).await)
}
