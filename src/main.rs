use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recipebook::bot::{self, RecipeBotEngine};
use recipebook::config::BotConfig;
use recipebook::db::CatalogStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting RecipeBook Telegram Bot");

    let config = BotConfig::from_env()?;

    info!(database_url = %config.database_url, "Initializing database");
    let store = CatalogStore::connect(&config.database_url).await?;

    let engine = Arc::new(RecipeBotEngine::new(store, config.engine.clone()));

    // Periodically drop idle sessions so the registry does not grow unbounded
    let sweeper = {
        let engine = Arc::clone(&engine);
        let period = config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                engine.sessions().evict_idle();
            }
        })
    };

    let bot = Bot::new(config.telegram_token);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(bot::message_handler))
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    sweeper.abort();
    info!("Bot stopped");

    Ok(())
}
