//! Outbound effects: what the transport should show, as structured data.

use serde::{Deserialize, Serialize};

use crate::action::ActionToken;
use crate::db::UserId;

/// Inline button: a label and the token sent back when pressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    pub fn new(label: impl Into<String>, token: ActionToken) -> Self {
        Self {
            label: label.into(),
            token: token.to_string(),
        }
    }
}

/// Keyboard description; rendering is up to the transport
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Keyboard {
    /// Leave whatever keyboard is showing
    #[default]
    None,
    /// Buttons attached to the message
    Inline(Vec<Vec<Button>>),
    /// Persistent menu of text labels
    Menu(Vec<Vec<String>>),
}

impl Keyboard {
    /// Every token reachable from this keyboard, in row order
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Keyboard::Inline(rows) => rows
                .iter()
                .flatten()
                .map(|button| button.token.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// One reply to render for a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub user_id: UserId,
    pub text: String,
    pub keyboard: Keyboard,
    /// Edit the message the action came from instead of sending a new one
    pub replace_previous: bool,
    /// Short transient acknowledgement (a toast on platforms that have one)
    pub notice: Option<String>,
}

impl Effect {
    pub fn reply(user_id: UserId, text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            user_id,
            text: text.into(),
            keyboard,
            replace_previous: false,
            notice: None,
        }
    }

    pub fn replace(user_id: UserId, text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            replace_previous: true,
            ..Self::reply(user_id, text, keyboard)
        }
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}
