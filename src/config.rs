//! # Bot Configuration Module
//!
//! Runtime settings for the recipe bot, read from the process environment
//! (optionally populated from a `.env` file).

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

// Constants for bot configuration
pub const DEFAULT_DATABASE_URL: &str = "sqlite://recipes.db";
pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Settings the conversation engine needs, independent of the transport
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Recipes shown per listing page
    pub page_size: u32,
    /// Maximum number of search results returned
    pub search_limit: u32,
    /// Drafts untouched for this long are discarded; `None` disables expiry
    pub session_idle_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            search_limit: DEFAULT_SEARCH_LIMIT,
            session_idle_timeout: None,
        }
    }
}

/// Full process configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub database_url: String,
    pub engine: EngineConfig,
    /// How often the idle-session sweeper runs
    pub sweep_interval: Duration,
}

impl BotConfig {
    /// Build the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let telegram_token =
            env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let page_size = parse_var("PAGE_SIZE")?.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let search_limit = parse_var("SEARCH_LIMIT")?
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .max(1);
        let session_idle_timeout = parse_var::<u64>("SESSION_IDLE_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        let sweep_interval = Duration::from_secs(
            parse_var("SESSION_SWEEP_INTERVAL_SECS")?
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS)
                .max(1),
        );

        Ok(Self {
            telegram_token,
            database_url,
            engine: EngineConfig {
                page_size,
                search_limit,
                session_idle_timeout,
            },
            sweep_interval,
        })
    }
}

/// Read an optional numeric variable; present-but-invalid is an error
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(None),
    }
}
