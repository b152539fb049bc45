use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub stream: StreamConfig,
    pub replay: ReplayConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StreamConfig {
    /// Upstream stream id for leaderboard subscriptions
    pub leaderboard_event_id: Option<String>,
    /// Upstream stream id for tournament subscriptions
    pub tournament_event_id: Option<String>,
    pub only_push_changes: bool,
    /// Wallet whose events raise personal notices
    pub watch_address: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayConfig {
    pub dir: PathBuf,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./replay"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let only_push_changes = match var("ONLY_PUSH_CHANGES") {
            Some(value) => value
                .trim()
                .parse::<bool>()
                .with_context(|| format!("ONLY_PUSH_CHANGES must be true or false, got '{}'", value))?,
            None => false,
        };

        Ok(Config {
            stream: StreamConfig {
                leaderboard_event_id: var("LEADERBOARD_STREAM_EVENT_ID"),
                tournament_event_id: var("TOURNAMENT_STREAM_EVENT_ID"),
                only_push_changes,
                watch_address: var("WATCH_ADDRESS"),
            },
            replay: ReplayConfig {
                dir: var("REPLAY_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| ReplayConfig::default().dir),
            },
            log: LogConfig {
                rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            },
        })
    }
}
