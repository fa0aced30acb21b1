//! # Inbound Action Module
//!
//! Transport-neutral description of what a user did, and its translation
//! into a typed [`Action`]. Button payloads are compact colon-separated tokens
//! so they fit inside chat platform callback limits.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::UserId;
use crate::localization::t;
use crate::pagination::PageNav;
use crate::rating::RatingValue;

/// How the transport received the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Command,
    Text,
    ButtonPress,
}

/// Raw action as produced by the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundAction {
    pub user_id: UserId,
    pub display_name: String,
    pub kind: ActionKind,
    pub payload: String,
}

impl InboundAction {
    pub fn command(user_id: UserId, display_name: &str, command: &str) -> Self {
        Self::new(user_id, display_name, ActionKind::Command, command)
    }

    pub fn text(user_id: UserId, display_name: &str, text: &str) -> Self {
        Self::new(user_id, display_name, ActionKind::Text, text)
    }

    pub fn button(user_id: UserId, display_name: &str, token: impl fmt::Display) -> Self {
        Self::new(user_id, display_name, ActionKind::ButtonPress, &token.to_string())
    }

    fn new(user_id: UserId, display_name: &str, kind: ActionKind, payload: &str) -> Self {
        Self {
            user_id,
            display_name: display_name.to_string(),
            kind,
            payload: payload.to_string(),
        }
    }
}

/// Payload attached to an inline button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionToken {
    Category(i64),
    Recipe(i64),
    Page {
        nav: PageNav,
        current: u32,
        category_id: Option<i64>,
    },
    Rate {
        recipe_id: i64,
        value: RatingValue,
    },
    Random,
    Categories,
    Home,
    Cancel,
}

impl fmt::Display for ActionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionToken::Category(id) => write!(f, "cat:{id}"),
            ActionToken::Recipe(id) => write!(f, "rec:{id}"),
            ActionToken::Page {
                nav,
                current,
                category_id,
            } => {
                let prefix = match nav {
                    PageNav::Prev => "prev",
                    PageNav::Next => "next",
                };
                write!(f, "{prefix}:{current}:{}", category_id.unwrap_or(0))
            }
            ActionToken::Rate { recipe_id, value } => match value {
                RatingValue::Like => write!(f, "like:{recipe_id}"),
                RatingValue::Dislike => write!(f, "dislike:{recipe_id}"),
            },
            ActionToken::Random => write!(f, "random"),
            ActionToken::Categories => write!(f, "categories"),
            ActionToken::Home => write!(f, "home"),
            ActionToken::Cancel => write!(f, "cancel"),
        }
    }
}

impl ActionToken {
    /// Parse a button payload; `None` for anything malformed
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split(':');
        let head = parts.next()?;
        let args: Vec<&str> = parts.collect();

        let id = |idx: usize| -> Option<i64> { args.get(idx)?.parse::<i64>().ok() };

        let token = match (head, args.len()) {
            ("cat", 1) => ActionToken::Category(id(0)?),
            ("rec", 1) => ActionToken::Recipe(id(0)?),
            ("like", 1) => ActionToken::Rate {
                recipe_id: id(0)?,
                value: RatingValue::Like,
            },
            ("dislike", 1) => ActionToken::Rate {
                recipe_id: id(0)?,
                value: RatingValue::Dislike,
            },
            ("prev" | "next", 2) => {
                let nav = if head == "prev" {
                    PageNav::Prev
                } else {
                    PageNav::Next
                };
                let current = args[0].parse::<u32>().ok()?;
                let category = id(1)?;
                ActionToken::Page {
                    nav,
                    current,
                    category_id: (category > 0).then_some(category),
                }
            }
            ("random", 0) => ActionToken::Random,
            ("categories", 0) => ActionToken::Categories,
            ("home", 0) => ActionToken::Home,
            ("cancel", 0) => ActionToken::Cancel,
            _ => return None,
        };

        Some(token)
    }
}

/// Typed action the engine dispatches on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    Help,
    Home,
    Cancel,
    StartAdd,
    ShowCategories,
    ShowAllRecipes,
    StartSearch,
    Random,
    PickCategory(i64),
    OpenRecipe(i64),
    Navigate {
        nav: PageNav,
        current: u32,
        category_id: Option<i64>,
    },
    Rate {
        recipe_id: i64,
        value: RatingValue,
    },
    Text(String),
    Unknown(String),
}

impl From<ActionToken> for Action {
    fn from(token: ActionToken) -> Self {
        match token {
            ActionToken::Category(id) => Action::PickCategory(id),
            ActionToken::Recipe(id) => Action::OpenRecipe(id),
            ActionToken::Page {
                nav,
                current,
                category_id,
            } => Action::Navigate {
                nav,
                current,
                category_id,
            },
            ActionToken::Rate { recipe_id, value } => Action::Rate { recipe_id, value },
            ActionToken::Random => Action::Random,
            ActionToken::Categories => Action::ShowCategories,
            ActionToken::Home => Action::Home,
            ActionToken::Cancel => Action::Cancel,
        }
    }
}

impl Action {
    pub fn from_inbound(inbound: &InboundAction) -> Self {
        match inbound.kind {
            ActionKind::Command => Self::from_command(&inbound.payload),
            ActionKind::Text => Self::from_text(&inbound.payload),
            ActionKind::ButtonPress => ActionToken::parse(&inbound.payload)
                .map(Action::from)
                .unwrap_or_else(|| Action::Unknown(inbound.payload.clone())),
        }
    }

    /// `/start`, `start`, `/start@recipe_bot` and `/start deep-link` all mean start
    fn from_command(raw: &str) -> Self {
        let word = raw
            .trim()
            .trim_start_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or("");
        let name = word.split('@').next().unwrap_or("").to_lowercase();

        match name.as_str() {
            "start" => Action::Start,
            "help" => Action::Help,
            "home" | "menu" => Action::Home,
            "cancel" => Action::Cancel,
            "add" => Action::StartAdd,
            "categories" => Action::ShowCategories,
            "recipes" | "all" => Action::ShowAllRecipes,
            "search" => Action::StartSearch,
            "random" => Action::Random,
            _ => Action::Unknown(raw.to_string()),
        }
    }

    /// Menu labels map to their actions; anything else is free text
    fn from_text(raw: &str) -> Self {
        let text = raw.trim();
        let menu = [
            ("menu-all-recipes", Action::ShowAllRecipes),
            ("menu-categories", Action::ShowCategories),
            ("menu-random", Action::Random),
            ("menu-add", Action::StartAdd),
            ("menu-search", Action::StartSearch),
            ("menu-cancel", Action::Cancel),
            ("menu-home", Action::Home),
        ];

        menu.into_iter()
            .find(|(key, _)| t(key) == text)
            .map(|(_, action)| action)
            .unwrap_or_else(|| Action::Text(raw.to_string()))
    }
}
