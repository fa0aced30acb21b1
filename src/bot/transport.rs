//! Rendering of engine effects as Telegram API calls

use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, MessageId,
    ReplyMarkup,
};
use tracing::{debug, error};

use crate::effect::{Button, Effect, Keyboard};

fn inline_markup(rows: &[Vec<Button>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.label.clone(), button.token.clone()))
            .collect::<Vec<_>>()
    }))
}

/// Markup for a freshly sent message; `None` keeps the current one
pub fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::None => None,
        Keyboard::Inline(rows) => Some(inline_markup(rows).into()),
        Keyboard::Menu(rows) => {
            let buttons = rows
                .iter()
                .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>());
            Some(KeyboardMarkup::new(buttons).resize_keyboard().into())
        }
    }
}

/// Where the action came from: replies go back to that chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub chat_id: ChatId,
    /// Message carrying the pressed button, when it is still reachable
    pub message_id: Option<MessageId>,
}

/// How a single effect is put on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Send(ChatId),
    Edit(ChatId, MessageId),
}

/// Edits only apply when the action came from a message we can still reach
/// and the effect carries an inline keyboard (or none); a persistent menu
/// cannot be attached to an edited message, so those are sent anew.
pub fn plan_delivery(effect: &Effect, origin: Origin) -> Delivery {
    let editable =
        effect.replace_previous && matches!(effect.keyboard, Keyboard::Inline(_) | Keyboard::None);

    match origin.message_id {
        Some(message_id) if editable => Delivery::Edit(origin.chat_id, message_id),
        _ => Delivery::Send(origin.chat_id),
    }
}

async fn send(bot: &Bot, chat_id: ChatId, effect: &Effect) -> Result<(), teloxide::RequestError> {
    let request = bot.send_message(chat_id, effect.text.clone());
    match reply_markup(&effect.keyboard) {
        Some(markup) => request.reply_markup(markup).await?,
        None => request.await?,
    };
    Ok(())
}

async fn edit(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    effect: &Effect,
) -> Result<(), teloxide::RequestError> {
    let request = bot.edit_message_text(chat_id, message_id, effect.text.clone());
    match &effect.keyboard {
        Keyboard::Inline(rows) => request.reply_markup(inline_markup(rows)).await?,
        _ => request.await?,
    };
    Ok(())
}

/// Deliver effects in order. Delivery failures are logged and do not stop
/// the remaining effects.
pub async fn deliver(bot: &Bot, effects: &[Effect], origin: Origin) {
    for effect in effects {
        let result = match plan_delivery(effect, origin) {
            Delivery::Edit(chat_id, message_id) => match edit(bot, chat_id, message_id, effect).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    debug!(user_id = effect.user_id, error = %e, "Edit failed, sending a new message");
                    send(bot, chat_id, effect).await
                }
            },
            Delivery::Send(chat_id) => send(bot, chat_id, effect).await,
        };

        if let Err(e) = result {
            error!(user_id = effect.user_id, chat_id = %origin.chat_id, error = %e, "Failed to deliver message");
        }
    }
}
