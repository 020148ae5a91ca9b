//! Community event handlers: comments, participation, edits and new events.

use chrono::Local;
use garage_core::channels::CHANNEL_EVENTS;
use garage_core::diff;
use garage_core::models::{Event, EventComment, EventType};
use garage_core::notification_types::{
    TYPE_EVENT_COMMENT, TYPE_EVENT_PARTICIPANT_JOINED, TYPE_EVENT_PARTICIPANT_LEFT,
    TYPE_EVENT_UPDATE, TYPE_NEW_EVENT,
};
use garage_core::settings::Category;
use garage_core::text;
use garage_core::types::DocId;

use super::{Delivery, Outgoing, TriggerContext, TriggerError};
use crate::bus::DocumentChange;
use crate::recipients::Recipient;

/// Longest comment preview shown in a notification body.
pub const COMMENT_PREVIEW_CHARS: usize = 100;

/// Participants and the creator, each once, without `exclude`.
fn audience(event: &Event, exclude: &str) -> Vec<DocId> {
    let mut uids: Vec<DocId> = Vec::new();
    for uid in event.participants.iter().chain(std::iter::once(&event.creator_id)) {
        if !uid.is_empty() && uid != exclude && !uids.contains(uid) {
            uids.push(uid.clone());
        }
    }
    uids
}

/// Point-resolve each uid and keep those allowed to receive `category`.
///
/// A uid whose lookup fails is skipped.
async fn resolve_each(ctx: &TriggerContext, uids: &[DocId], category: Category) -> Vec<Recipient> {
    let mut recipients = Vec::with_capacity(uids.len());
    for uid in uids {
        let Some(user) = ctx.lookup(uid).await else {
            continue;
        };
        if let Some(recipient) = user.recipient(uid, category) {
            recipients.push(recipient);
        }
    }
    recipients
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// A comment notifies everyone taking part in the event except its author.
pub async fn on_comment_created(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let comment: EventComment = change.decode_after()?;
    let event_id = match change.path.parent() {
        Some(parent) => parent.id().to_string(),
        None => comment.event_id.clone(),
    };

    let Some(event) = ctx.store.get_event(&event_id).await? else {
        tracing::warn!(event_id = %event_id, comment_id = %comment.id, "Commented event not found");
        return Ok(Delivery::default());
    };

    let uids = audience(&event, &comment.user_id);
    let recipients = resolve_each(ctx, &uids, Category::EventComments).await;

    let title = format!("💬 {}", event.title);
    let body = format!(
        "{}: {}",
        comment.user_name,
        text::truncate(&comment.text, COMMENT_PREVIEW_CHARS)
    );

    let outgoing = recipients
        .iter()
        .map(|r| {
            Outgoing::to(r, CHANNEL_EVENTS, TYPE_EVENT_COMMENT, &title, &body)
                .with_data("eventId", &event.id)
                .with_data("commentId", &comment.id)
        })
        .collect();

    Ok(ctx.fan_out("event_comment", outgoing).await)
}

// ---------------------------------------------------------------------------
// Participation
// ---------------------------------------------------------------------------

/// Joins and departures are reported to the event creator.
///
/// When the same update both adds and removes participants only the joins
/// are reported.
pub async fn on_participation_changed(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let before: Event = change.decode_before()?;
    let after: Event = change.decode_after()?;

    let joined = diff::added(&before.participants, &after.participants);
    let left = diff::removed(&before.participants, &after.participants);

    let (changed, kind, verb) = if !joined.is_empty() {
        (joined, TYPE_EVENT_PARTICIPANT_JOINED, "se přihlásil/a na")
    } else if !left.is_empty() {
        (left, TYPE_EVENT_PARTICIPANT_LEFT, "se odhlásil/a z")
    } else {
        return Ok(Delivery::default());
    };

    let creator_id = after.creator_id.as_str();
    let Some(creator) = ctx
        .resolver
        .single(creator_id)
        .await?
        .recipient(creator_id, Category::EventParticipation)
    else {
        return Ok(Delivery::default());
    };

    let mut outgoing = Vec::new();
    for uid in changed.iter().filter(|uid| uid.as_str() != creator_id) {
        let participant = ctx.lookup(uid).await.unwrap_or_default();
        let name = participant.display_name.as_deref().unwrap_or("Někdo");
        let title = match kind {
            TYPE_EVENT_PARTICIPANT_JOINED => "👋 Nový účastník",
            _ => "👋 Účastník se odhlásil",
        };
        outgoing.push(
            Outgoing::to(&creator, CHANNEL_EVENTS, kind, title, format!("{name} {verb} {}", after.title))
                .with_data("eventId", &after.id)
                .with_data("userId", uid),
        );
    }

    Ok(ctx.fan_out("event_participation", outgoing).await)
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

/// Czech names of the event fields whose change is announced.
pub fn changed_fields(before: &Event, after: &Event) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if before.title != after.title {
        fields.push("název");
    }
    if before.date != after.date {
        fields.push("datum");
    }
    if before.end_date != after.end_date {
        fields.push("konec");
    }
    if before.location != after.location {
        fields.push("místo");
    }
    fields
}

/// Edits to title, date, end or place are announced to the participants.
///
/// The creator is the one editing, so they are left out.
pub async fn on_event_details_changed(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let before: Event = change.decode_before()?;
    let after: Event = change.decode_after()?;

    let fields = changed_fields(&before, &after);
    if fields.is_empty() {
        return Ok(Delivery::default());
    }

    let uids = audience(&after, &after.creator_id);
    let recipients = resolve_each(ctx, &uids, Category::EventChanges).await;

    let title = format!("📅 Změna akce: {}", after.title);
    let body = format!("Změněno: {}", text::join_list(&fields));

    let outgoing = recipients
        .iter()
        .map(|r| {
            Outgoing::to(r, CHANNEL_EVENTS, TYPE_EVENT_UPDATE, &title, &body)
                .with_data("eventId", &after.id)
        })
        .collect();

    Ok(ctx.fan_out("event_update", outgoing).await)
}

// ---------------------------------------------------------------------------
// New events
// ---------------------------------------------------------------------------

/// Body of a new-event notification: title, then date and place when known.
pub fn new_event_body(event: &Event) -> String {
    let mut parts = vec![event.title.clone()];
    if let Some(date) = event.starts_at() {
        parts.push(text::format_date(&date.with_timezone(&Local)));
    }
    if let Some(place) = event.location_label() {
        parts.push(place.to_string());
    }
    parts.join(" · ")
}

/// A new event is announced to users subscribed to its kind.
pub async fn on_event_created(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let event: Event = change.decode_after()?;
    let event_type = event.event_type.unwrap_or(EventType::Other);

    let recipients = ctx.resolver.for_new_event(event_type, &event.creator_id).await?;

    let title = format!("🏁 Nová akce: {}", event_type.label());
    let body = new_event_body(&event);

    let outgoing = recipients
        .iter()
        .map(|r| {
            Outgoing::to(r, CHANNEL_EVENTS, TYPE_NEW_EVENT, &title, &body)
                .with_data("eventId", &event.id)
        })
        .collect();

    Ok(ctx.fan_out("new_event", outgoing).await)
}
