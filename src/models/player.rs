use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::game_event::{AchievementUnlockedEvent, RankDirection, Rarity};

pub const DEFAULT_AVATAR: &str = "🎮";
pub const ACHIEVEMENT_ICON: &str = "🏆";

/// Achievement as stored on a player record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
    pub rarity: Rarity,
}

impl From<&AchievementUnlockedEvent> for Achievement {
    fn from(event: &AchievementUnlockedEvent) -> Self {
        Self {
            id: event.achievement_id.clone(),
            name: event.achievement_name.clone(),
            description: event.achievement_description.clone(),
            icon: ACHIEVEMENT_ICON.to_string(),
            unlocked_at: Some(event.timestamp),
            rarity: event.rarity,
        }
    }
}

/// Player record keyed by lowercase wallet address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub wallet_address: String,
    pub username: String,
    pub avatar: String,
    /// 0 means unranked
    pub rank: u64,
    pub score: u64,
    pub wins: u64,
    pub losses: u64,
    /// Percentage in 0..=100 with one decimal place
    pub win_rate: f64,
    pub level: u32,
    pub achievements: Vec<Achievement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_change: Option<RankDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Partial update merged into a player record.
///
/// `None` fields leave the record untouched. When `wins` or `losses` is set
/// and `win_rate` is not, the win rate is recomputed from the merged totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerUpdate {
    pub score: Option<u64>,
    pub rank: Option<u64>,
    pub rank_change: Option<RankDirection>,
    pub wins: Option<u64>,
    pub losses: Option<u64>,
    pub win_rate: Option<f64>,
    pub new_achievements: Vec<Achievement>,
}

impl Player {
    /// Placeholder record for an address seen for the first time
    pub fn placeholder(address: &str) -> Self {
        let prefix: String = address.chars().take(6).collect();
        Self {
            id: canonical_address(address),
            wallet_address: address.to_string(),
            username: format!("Player {}", prefix),
            avatar: DEFAULT_AVATAR.to_string(),
            rank: 0,
            score: 0,
            wins: 0,
            losses: 0,
            win_rate: 0.0,
            level: 1,
            achievements: Vec::new(),
            rank_change: None,
            last_updated: None,
        }
    }

    /// Merge `update` into this record and stamp it with `now`
    pub fn merged(mut self, update: PlayerUpdate, now: DateTime<Utc>) -> Self {
        if let Some(score) = update.score {
            self.score = score;
        }
        if let Some(rank) = update.rank {
            self.rank = rank;
        }
        if let Some(direction) = update.rank_change {
            self.rank_change = Some(direction);
        }

        let record_changed = update.wins.is_some() || update.losses.is_some();
        if let Some(wins) = update.wins {
            self.wins = wins;
        }
        if let Some(losses) = update.losses {
            self.losses = losses;
        }
        match update.win_rate {
            Some(rate) => self.win_rate = rate,
            None if record_changed => self.win_rate = win_rate(self.wins, self.losses),
            None => {}
        }

        self.achievements.extend(update.new_achievements);
        self.last_updated = Some(now);
        self
    }

    pub fn games_played(&self) -> u64 {
        self.wins + self.losses
    }
}

/// Map key for an address: lowercase, original characters otherwise kept
pub fn canonical_address(address: &str) -> String {
    address.to_ascii_lowercase()
}

/// `round(wins / (wins + losses) * 1000) / 10`, or 0 with no games played
pub fn win_rate(wins: u64, losses: u64) -> f64 {
    let total = wins + losses;
    if total == 0 {
        return 0.0;
    }
    ((wins as f64 / total as f64) * 1000.0).round() / 10.0
}
