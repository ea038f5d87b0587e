//! Motorist - Telegram assistant bot for car owners.
//!
//! Free-form questions go to an external RAG backend through an
//! asynchronous submit-then-poll gateway, gated by per-user question
//! quotas. Administrators manage the roster, limits, templates and
//! statistics.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB models and repositories
//! - `cache` - LRU-based caching with Moka
//! - `limits` - Per-user question rate limiting
//! - `rag` - RAG gateway (submit, poll, ledger)
//! - `bot` - Dispatcher and runtime (with Throttle for API rate limiting)
//! - `plugins` - Command handlers (extensible)
//! - `events` - Question and media handlers
//! - `utils` - Utility functions

mod bot;
mod cache;
mod config;
mod database;
mod events;
mod limits;
mod plugins;
mod rag;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::AppState;
use cache::CacheRegistry;
use config::Config;
use database::Database;
use rag::RagConfig;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // Initialize logging with sensible defaults
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("motorist=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting Motorist bot...");

    let config = Config::from_env();
    let rag_config = RagConfig::from_env();
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    db.ensure_indexes().await?;
    let db = Arc::new(db);
    info!("Database connected");

    let cache = Arc::new(CacheRegistry::new());

    let state = AppState::new(
        db,
        cache,
        rag_config,
        config.bootstrap_secret.clone(),
    )?;

    // Seed defaults: templates only where missing, admins upserted.
    state.templates.seed_defaults().await?;
    for seed in &config.admin_seeds {
        state
            .users
            .ensure_admin(seed.user_id, seed.username.as_deref())
            .await?;
        info!("Admin {} seeded", seed.user_id);
    }
    if config.admin_seeds.is_empty() {
        info!("No admins configured (ADMIN_USER_IDS is empty)");
    }

    // Throttle keeps us inside Telegram's API rate limits.
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    let dispatcher = bot::build_dispatcher(bot.clone(), state);

    bot::run(&config, dispatcher, bot).await;

    Ok(())
}
