//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::User;
use tracing::{debug, warn};

use crate::action::InboundAction;
use crate::db::UserId;
use crate::localization::t;

use super::engine::RecipeBotEngine;
use super::transport::{deliver, Origin};

/// Engine-side identity of a Telegram user
pub fn user_identity(user: &User) -> (UserId, String) {
    let user_id = user.id.0 as UserId;
    let name = user.full_name();
    let display_name = if name.trim().is_empty() {
        user.username.clone().unwrap_or_else(|| user_id.to_string())
    } else {
        name
    };
    (user_id, display_name)
}

/// Classify message text: a leading slash makes it a command
pub fn inbound_from_text(user_id: UserId, display_name: &str, text: &str) -> InboundAction {
    if text.trim_start().starts_with('/') {
        InboundAction::command(user_id, display_name, text)
    } else {
        InboundAction::text(user_id, display_name, text)
    }
}

pub async fn message_handler(bot: Bot, msg: Message, engine: Arc<RecipeBotEngine>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without a sender");
        return Ok(());
    };
    let (user_id, display_name) = user_identity(user);

    let Some(text) = msg.text() else {
        warn!(user_id, "Unsupported message type received");
        bot.send_message(msg.chat.id, t("unknown-input")).await?;
        return Ok(());
    };

    let effects = engine
        .handle(inbound_from_text(user_id, &display_name, text))
        .await;
    let origin = Origin {
        chat_id: msg.chat.id,
        message_id: None,
    };
    deliver(&bot, &effects, origin).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    #[test]
    fn test_slash_text_is_a_command() {
        assert_eq!(inbound_from_text(1, "Ann", "/add").kind, ActionKind::Command);
        assert_eq!(inbound_from_text(1, "Ann", "pancakes").kind, ActionKind::Text);
    }
}
