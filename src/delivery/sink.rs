use crate::delivery::split::{split_text, MESSAGE_LIMIT};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ReplyMarkup};
use teloxide::ApiError;
use teloxide::RequestError;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("recipient blocked the bot")]
    Blocked,
    #[error("recipient account is deactivated")]
    Deactivated,
    #[error("chat not found")]
    ChatNotFound,
    #[error("rate limited and retry failed")]
    RateLimited,
    #[error("telegram transport error: {0}")]
    Transport(String),
}

/// Outbound message surface. The Telegram implementation splits long
/// texts and absorbs rate limiting; tests substitute a recording sink.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), DeliveryError>;

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        markup: Option<teloxide::types::InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError>;

    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), DeliveryError>;

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), DeliveryError>;
}

fn classify(err: &RequestError) -> DeliveryError {
    match err {
        RequestError::Api(ApiError::BotBlocked) => DeliveryError::Blocked,
        RequestError::Api(ApiError::UserDeactivated) => DeliveryError::Deactivated,
        RequestError::Api(ApiError::ChatNotFound) => DeliveryError::ChatNotFound,
        other => DeliveryError::Transport(other.to_string()),
    }
}

pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Sends one part, retrying exactly once after the interval Telegram
    /// asks for when it rate-limits.
    async fn send_part(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), DeliveryError> {
        let mut retried = false;
        loop {
            let mut request = self.bot.send_message(ChatId(chat_id), text);
            if let Some(markup) = markup.clone() {
                request = request.reply_markup(markup);
            }
            match request.await {
                Ok(_) => return Ok(()),
                Err(RequestError::RetryAfter(after)) if !retried => {
                    info!(
                        "chat {chat_id}: flood limit exceeded, sleeping {}s",
                        after.as_secs()
                    );
                    tokio::time::sleep(after).await;
                    retried = true;
                }
                Err(RequestError::RetryAfter(_)) => {
                    error!("chat {chat_id}: still rate limited after retry");
                    return Err(DeliveryError::RateLimited);
                }
                Err(err) => {
                    let classified = classify(&err);
                    error!("chat {chat_id}: send failed: {classified}");
                    return Err(classified);
                }
            }
        }
    }
}

#[async_trait]
impl Sink for TelegramSink {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<(), DeliveryError> {
        let parts = split_text(text, MESSAGE_LIMIT);
        let last = parts.len().saturating_sub(1);
        for (i, part) in parts.iter().enumerate() {
            // Keyboards belong on the final part only.
            let part_markup = if i == last { markup.clone() } else { None };
            self.send_part(chat_id, part, part_markup).await?;
        }
        Ok(())
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i32,
        text: &str,
        markup: Option<teloxide::types::InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError> {
        let mut retried = false;
        loop {
            let mut request =
                self.bot
                    .edit_message_text(ChatId(chat_id), MessageId(message_id), text);
            if let Some(markup) = markup.clone() {
                request = request.reply_markup(markup);
            }
            match request.await {
                Ok(_) => return Ok(()),
                Err(RequestError::RetryAfter(after)) if !retried => {
                    tokio::time::sleep(after).await;
                    retried = true;
                }
                Err(RequestError::RetryAfter(_)) => return Err(DeliveryError::RateLimited),
                Err(err) => {
                    let classified = classify(&err);
                    error!("chat {chat_id}: edit failed: {classified}");
                    return Err(classified);
                }
            }
        }
    }

    async fn delete(&self, chat_id: i64, message_id: i32) -> Result<(), DeliveryError> {
        match self
            .bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                let classified = classify(&err);
                error!("chat {chat_id}: delete failed: {classified}");
                Err(classified)
            }
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: &str) -> Result<(), DeliveryError> {
        match self
            .bot
            .answer_callback_query(callback_id)
            .text(text)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => Err(classify(&err)),
        }
    }
}
