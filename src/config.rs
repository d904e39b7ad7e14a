use clap::Parser;

use crate::feed::espn::DEFAULT_SCOREBOARD_URL;

/// Weekly pick predictions from a league scoreboard feed
#[derive(Parser, Debug, Clone)]
#[command(name = "pickforge", version, about)]
pub struct Config {
    /// API listen address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8080")]
    pub api_addr: String,

    /// SQLite database path for stored predictions
    #[arg(long, env = "DATABASE_PATH", default_value = "pickforge.db")]
    pub database_path: String,

    /// Scoreboard endpoint
    #[arg(long, env = "FEED_URL", default_value = DEFAULT_SCOREBOARD_URL)]
    pub feed_url: String,

    /// Timeout for a single scoreboard request in seconds (never retried)
    #[arg(long, env = "FEED_TIMEOUT_SECS", default_value = "15")]
    pub feed_timeout_secs: u64,

    /// How long a fetched scoreboard week is reused, in seconds (0 disables caching)
    #[arg(long, env = "FEED_CACHE_TTL_SECS", default_value = "300")]
    pub feed_cache_ttl_secs: u64,

    /// Season segment sent with explicit-week requests (2 = regular season)
    #[arg(long, env = "SEASON_TYPE", default_value = "2")]
    pub season_type: u32,

    /// Recency window used when a prediction request does not give one
    #[arg(long, env = "DEFAULT_RECENT_GAMES", default_value = "3")]
    pub default_recent_games: usize,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.feed_timeout_secs == 0 {
            anyhow::bail!("feed_timeout_secs must be positive");
        }
        if self.season_type == 0 {
            anyhow::bail!("season_type must be positive");
        }
        if !(1..=10).contains(&self.default_recent_games) {
            anyhow::bail!("default_recent_games must be between 1 and 10");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::parse_from(["pickforge"]);
        assert_eq!(config.feed_timeout_secs, 15);
        assert_eq!(config.feed_cache_ttl_secs, 300);
        assert_eq!(config.season_type, 2);
        assert_eq!(config.feed_url, DEFAULT_SCOREBOARD_URL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_recent_games() {
        let config = Config::parse_from(["pickforge", "--default-recent-games", "11"]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = Config::parse_from(["pickforge", "--feed-timeout-secs", "0"]);
        assert!(config.validate().is_err());
    }
}
