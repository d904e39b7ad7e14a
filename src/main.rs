use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod db;
mod engine;
mod error;
mod feed;
mod season;
#[cfg(test)]
mod testing;

use api::AppState;
use config::Config;
use db::Database;
use engine::PickEngine;
use feed::{EspnScoreboard, FeedCache, NoopCache, ScoreboardSource, TtlCache};
use season::SeasonResolver;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open database
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    let cache: Arc<dyn FeedCache> = if config.feed_cache_ttl_secs == 0 {
        info!("Scoreboard caching disabled");
        Arc::new(NoopCache)
    } else {
        Arc::new(TtlCache::new(Duration::from_secs(config.feed_cache_ttl_secs)))
    };

    let feed: Arc<dyn ScoreboardSource> = Arc::new(EspnScoreboard::new(
        &config.feed_url,
        config.season_type,
        Duration::from_secs(config.feed_timeout_secs),
        cache,
    )?);
    info!(
        "Scoreboard source: {} ({}, timeout {}s, cache ttl {}s)",
        feed.name(),
        config.feed_url,
        config.feed_timeout_secs,
        config.feed_cache_ttl_secs
    );

    let resolver = SeasonResolver::new(feed, config.season_type);
    let engine = PickEngine::new(resolver, config.default_recent_games);

    let app = api::router(AppState { db, engine });
    let addr: SocketAddr = config.api_addr.parse()?;
    info!("API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
