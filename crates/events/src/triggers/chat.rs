//! Direct chat messages.

use garage_core::channels::CHANNEL_MESSAGES;
use garage_core::models::ChatMessage;
use garage_core::notification_types::TYPE_CHAT_MESSAGE;
use garage_core::settings::Category;
use garage_core::text;

use super::{Delivery, Outgoing, TriggerContext, TriggerError};
use crate::bus::DocumentChange;

/// Longest message preview shown in a notification body.
pub const MESSAGE_PREVIEW_CHARS: usize = 100;

/// A message notifies the other participant of the two-person room.
pub async fn on_message_created(
    ctx: &TriggerContext,
    change: &DocumentChange,
) -> Result<Delivery, TriggerError> {
    let message: ChatMessage = change.decode_after()?;
    let Some(chat_id) = change.path.parent().map(|p| p.id().to_string()) else {
        return Ok(Delivery::default());
    };

    let Some(room) = ctx.store.get_chat_room(&chat_id).await? else {
        tracing::warn!(chat_id = %chat_id, message_id = %message.id, "Chat room not found");
        return Ok(Delivery::default());
    };

    let Some(recipient_id) = room.other_participant(&message.sender_id) else {
        tracing::warn!(chat_id = %chat_id, "Chat room has no other participant");
        return Ok(Delivery::default());
    };

    let resolved = ctx.resolver.single(recipient_id).await?;
    let Some(recipient) = resolved.recipient(recipient_id, Category::ChatMessages) else {
        return Ok(Delivery::default());
    };

    let title = room.name_of(&message.sender_id).unwrap_or("Nová zpráva");
    let body = text::truncate(&message.text, MESSAGE_PREVIEW_CHARS);

    let outgoing = Outgoing::to(&recipient, CHANNEL_MESSAGES, TYPE_CHAT_MESSAGE, title, body)
        .with_data("chatId", &chat_id)
        .with_data("messageId", &message.id)
        .with_data("senderId", &message.sender_id);

    Ok(ctx.fan_out("chat_message", vec![outgoing]).await)
}
