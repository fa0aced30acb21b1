//! # RecipeBook Telegram Bot
//!
//! A conversational recipe catalog: browse recipes by category with paging,
//! rate them with like/dislike toggles, pick one at random, search by title
//! and add new recipes through a step-by-step dialogue.

pub mod action;
pub mod bot;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod effect;
pub mod errors;
pub mod localization;
pub mod pagination;
pub mod random_pick;
pub mod rating;
pub mod session;
