use crate::bot::conversation::Conversation;
use crate::bot::handlers::message::HandlerResult;
use std::sync::Arc;
use teloxide::prelude::*;

pub async fn callback_handler(q: CallbackQuery, conversation: Arc<Conversation>) -> HandlerResult {
    let chat_id = q
        .message
        .as_ref()
        .map(|m| m.chat.id.0)
        .unwrap_or(q.from.id.0 as i64);
    let message_id = q.message.as_ref().map(|m| m.id.0);

    if let Some(data) = q.data.as_deref() {
        tracing::info!("callback '{}' from chat {}", data, chat_id);
        if let Err(e) = conversation
            .handle_callback(chat_id, message_id, &q.id, data)
            .await
        {
            tracing::error!("chat {chat_id}: callback handling failed: {e}");
        }
    }
    Ok(())
}
