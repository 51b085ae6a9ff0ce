pub mod callback;
pub mod message;

use crate::bot::conversation::Conversation;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

pub use message::Command;

pub struct BotHandler {
    pub conversation: Arc<Conversation>,
}

impl BotHandler {
    pub fn new(conversation: Arc<Conversation>) -> Self {
        Self { conversation }
    }

    pub fn schema(&self) -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
        use teloxide::dispatching::UpdateFilterExt;

        let conv_command = self.conversation.clone();
        let conv_text = self.conversation.clone();
        let conv_callback = self.conversation.clone();

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let conversation = conv_command.clone();
                        async move { message::command_handler(bot, msg, cmd, conversation).await }
                    }),
            )
            .branch(Update::filter_message().endpoint(move |msg: Message| {
                let conversation = conv_text.clone();
                async move { message::text_handler(msg, conversation).await }
            }))
            .branch(Update::filter_callback_query().endpoint(move |q: CallbackQuery| {
                let conversation = conv_callback.clone();
                async move { callback::callback_handler(q, conversation).await }
            }))
    }
}
