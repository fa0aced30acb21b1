//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `engine`: Transport-independent conversation engine
//! - `dialogue_manager`: Recipe creation state transitions and validation
//! - `ui_builder`: Keyboards and message formatting
//! - `message_handler`: Incoming text messages
//! - `callback_handler`: Inline keyboard callback queries
//! - `transport`: Rendering engine effects through the Telegram API

pub mod callback_handler;
pub mod dialogue_manager;
pub mod engine;
pub mod message_handler;
pub mod transport;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use engine::RecipeBotEngine;
pub use message_handler::message_handler;
