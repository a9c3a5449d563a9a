//! Telegram update handlers and the relay they drive.

use std::sync::Arc;

use chrono::Local;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, MessageId, ReplyParameters, User};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::relay::completion::CompletionProvider;
use crate::relay::menu::{self, MenuAction, Reply};
use crate::relay::router::PromptRouter;
use crate::relay::users::{UserLogger, UserRecord};

/// Telegram's limit for a single text message, in UTF-16 code units.
const MAX_MESSAGE_UNITS: usize = 4096;

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    /// Show the main menu.
    Start,
}

/// Services shared by all handlers.
pub struct Relay {
    router: PromptRouter,
    completion: Arc<dyn CompletionProvider>,
    users: UserLogger,
}

impl Relay {
    pub fn new(router: PromptRouter, completion: Arc<dyn CompletionProvider>, users: UserLogger) -> Self {
        Self {
            router,
            completion,
            users,
        }
    }

    /// Append the user to the log. Failures are logged and otherwise ignored.
    pub async fn record_user(&self, user: &User) {
        let record = UserRecord::from_user(user, Local::now());
        if let Err(e) = self.users.record(&record).await {
            warn!("Failed to record user {}: {e}", user.id);
        }
    }

    /// Generated answer with the return-to-menu button; `None` for empty text.
    pub async fn answer(&self, text: &str) -> Option<Reply> {
        if text.is_empty() {
            return None;
        }

        let (_domain, messages) = self.router.prepare(text).await;
        let generated = self.completion.complete(&messages).await;

        Some(Reply {
            text: generated,
            keyboard: Some(menu::return_menu()),
        })
    }
}

pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(dptree::entry().filter_command::<Command>().endpoint(handle_command))
                .branch(dptree::endpoint(handle_text)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback))
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, relay: Arc<Relay>) -> ResponseResult<()> {
    match cmd {
        Command::Start => {
            if let Some(ref user) = msg.from {
                info!("👋 /start from {} ({})", display_name(user), user.id);
                relay.record_user(user).await;
            }
            send_reply(&bot, msg.chat.id, menu::welcome(), Some(msg.id)).await
        }
    }
}

async fn handle_text(bot: Bot, msg: Message, relay: Arc<Relay>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(()),
    };

    let preview: String = text.chars().take(100).collect();
    match msg.from {
        Some(ref user) => info!("📨 Message from {} ({}): \"{preview}\"", display_name(user), user.id),
        None => info!("📨 Message in chat {}: \"{preview}\"", msg.chat.id),
    }

    if let Err(e) = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await {
        warn!("Failed to send typing action: {e}");
    }

    let Some(reply) = relay.answer(text).await else {
        return Ok(());
    };
    send_reply(&bot, msg.chat.id, reply, Some(msg.id)).await
}

async fn handle_callback(bot: Bot, q: CallbackQuery) -> ResponseResult<()> {
    let data = q.data.as_deref().unwrap_or("");
    let chat_id = q.message.as_ref().map(|m| m.chat().id);
    info!("🔘 Callback \"{data}\" from {} ({})", display_name(&q.from), q.from.id);

    match (MenuAction::parse(data), chat_id) {
        (Some(action), Some(chat_id)) => {
            if let Err(e) = send_reply(&bot, chat_id, menu::callback_reply(action), None).await {
                warn!("Failed to answer {}: {e}", action.as_str());
            }
        }
        (None, _) => warn!("Unknown callback data: \"{data}\""),
        (Some(action), None) => warn!("Callback {} has no originating chat", action.as_str()),
    }

    // Always clear the button's loading state, whatever happened above.
    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn send_reply(bot: &Bot, chat_id: ChatId, reply: Reply, reply_to: Option<MessageId>) -> ResponseResult<()> {
    let parts = split_message(&reply.text, MAX_MESSAGE_UNITS);
    let last = parts.len() - 1;

    for (i, part) in parts.into_iter().enumerate() {
        let mut request = bot.send_message(chat_id, part);
        if i == 0
            && let Some(id) = reply_to
        {
            request = request.reply_parameters(ReplyParameters::new(id));
        }
        if i == last
            && let Some(ref keyboard) = reply.keyboard
        {
            request = request.reply_markup(keyboard.clone());
        }
        request.await?;
    }

    Ok(())
}

fn display_name(user: &User) -> &str {
    user.username.as_deref().unwrap_or(&user.first_name)
}

/// Split `text` into chunks of at most `max_units` UTF-16 code units, the unit
/// Telegram measures length in. Chunks end on char boundaries. Always returns at least one chunk.
pub fn split_message(text: &str, max_units: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut units = 0;

    for c in text.chars() {
        let width = c.len_utf16();
        if units + width > max_units && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            units = 0;
        }
        current.push(c);
        units += width;
    }

    if !current.is_empty() || parts.is_empty() {
        parts.push(current);
    }
    parts
}
