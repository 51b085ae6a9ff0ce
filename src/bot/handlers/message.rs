use crate::bot::conversation::Conversation;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Timetable bot commands:")]
pub enum Command {
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Reset everything and start over")]
    Restart,
}

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    conversation: Arc<Conversation>,
) -> HandlerResult {
    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Start | Command::Restart => {
            let login = msg.from().and_then(|u| u.username.clone());
            if let Err(e) = conversation
                .handle_restart(msg.chat.id.0, login.as_deref())
                .await
            {
                tracing::error!("chat {}: restart failed: {e}", msg.chat.id.0);
            }
        }
    }
    Ok(())
}

pub async fn text_handler(msg: Message, conversation: Arc<Conversation>) -> HandlerResult {
    if let Some(text) = msg.text() {
        // Failures are scoped to this one interaction.
        if let Err(e) = conversation.handle_text(msg.chat.id.0, text).await {
            tracing::error!("chat {}: message handling failed: {e}", msg.chat.id.0);
        }
    }
    Ok(())
}
