use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Achievement rarity tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::Common => write!(f, "common"),
            Rarity::Rare => write!(f, "rare"),
            Rarity::Epic => write!(f, "epic"),
            Rarity::Legendary => write!(f, "legendary"),
        }
    }
}

/// Direction of a leaderboard rank movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RankDirection {
    Up,
    Down,
    Same,
}

impl From<u8> for RankDirection {
    fn from(value: u8) -> Self {
        match value {
            0 => RankDirection::Up,
            1 => RankDirection::Down,
            _ => RankDirection::Same,
        }
    }
}

impl std::fmt::Display for RankDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankDirection::Up => write!(f, "up"),
            RankDirection::Down => write!(f, "down"),
            RankDirection::Same => write!(f, "same"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdateEvent {
    pub player_address: String,
    pub score: u64,
    pub previous_score: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankChangeEvent {
    pub player_address: String,
    pub new_rank: u64,
    pub previous_rank: u64,
    pub timestamp: DateTime<Utc>,
    pub direction: RankDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementUnlockedEvent {
    pub player_address: String,
    pub achievement_id: String,
    pub achievement_name: String,
    pub achievement_description: String,
    pub rarity: Rarity,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultEvent {
    pub match_id: String,
    pub player1_address: String,
    pub player2_address: String,
    pub winner_address: String,
    pub player1_score: u64,
    pub player2_score: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MatchResultEvent {
    /// Whether `address` (any casing) won this match
    pub fn is_winner(&self, address: &str) -> bool {
        self.winner_address.eq_ignore_ascii_case(address)
    }

    /// Whether `address` (any casing) played in this match
    pub fn involves(&self, address: &str) -> bool {
        self.player1_address.eq_ignore_ascii_case(address)
            || self.player2_address.eq_ignore_ascii_case(address)
    }
}

/// Typed application event, discriminated on the wire by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    ScoreUpdate(ScoreUpdateEvent),
    RankChange(RankChangeEvent),
    AchievementUnlocked(AchievementUnlockedEvent),
    MatchResult(MatchResultEvent),
}

impl GameEvent {
    /// Every `type` value that identifies a game event
    pub const TYPE_TAGS: [&'static str; 4] =
        ["scoreUpdate", "rankChange", "achievementUnlocked", "matchResult"];

    pub fn is_type_tag(tag: &str) -> bool {
        Self::TYPE_TAGS.contains(&tag)
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            GameEvent::ScoreUpdate(_) => "scoreUpdate",
            GameEvent::RankChange(_) => "rankChange",
            GameEvent::AchievementUnlocked(_) => "achievementUnlocked",
            GameEvent::MatchResult(_) => "matchResult",
        }
    }

    /// The single player this event is about; `None` for match results.
    pub fn player_address(&self) -> Option<&str> {
        match self {
            GameEvent::ScoreUpdate(e) => Some(&e.player_address),
            GameEvent::RankChange(e) => Some(&e.player_address),
            GameEvent::AchievementUnlocked(e) => Some(&e.player_address),
            GameEvent::MatchResult(_) => None,
        }
    }

    /// Whether the event concerns `address`, compared case-insensitively.
    pub fn concerns(&self, address: &str) -> bool {
        match self {
            GameEvent::MatchResult(e) => e.involves(address),
            other => other
                .player_address()
                .is_some_and(|player| player.eq_ignore_ascii_case(address)),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            GameEvent::ScoreUpdate(e) => e.timestamp,
            GameEvent::RankChange(e) => e.timestamp,
            GameEvent::AchievementUnlocked(e) => e.timestamp,
            GameEvent::MatchResult(e) => e.timestamp,
        }
    }
}
