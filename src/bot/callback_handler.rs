//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use crate::action::InboundAction;

use super::engine::RecipeBotEngine;
use super::message_handler::user_identity;
use super::transport::{deliver, Origin};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    engine: Arc<RecipeBotEngine>,
) -> Result<()> {
    let (user_id, display_name) = user_identity(&q.from);
    let data = q.data.as_deref().unwrap_or("");
    debug!(user_id, data, "Received callback query from user");

    let effects = engine
        .handle(InboundAction::button(user_id, &display_name, data))
        .await;

    // Without the original message (too old to reach) fall back to the private chat
    let origin = match q.message.as_ref() {
        Some(msg) => Origin {
            chat_id: msg.chat().id,
            message_id: Some(msg.id()),
        },
        None => Origin {
            chat_id: ChatId(user_id),
            message_id: None,
        },
    };
    deliver(&bot, &effects, origin).await;

    // Answer the callback query to remove the loading state
    let answer = bot.answer_callback_query(q.id.clone());
    match effects.iter().find_map(|effect| effect.notice.clone()) {
        Some(notice) => answer.text(notice).await?,
        None => answer.await?,
    };

    Ok(())
}
