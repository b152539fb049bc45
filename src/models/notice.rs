use serde::Serialize;

use crate::stream_error::TransportError;

use super::game_event::{GameEvent, RankDirection, Rarity};
use super::subscription::SubscriptionPurpose;

/// Something the surrounding application may want to show the user.
///
/// Event notices are raised only for the watched wallet; error notices for
/// every transport error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StreamNotice {
    ScoreUpdated {
        score: u64,
        previous_score: u64,
    },
    RankChanged {
        new_rank: u64,
        direction: RankDirection,
    },
    AchievementUnlocked {
        name: String,
        rarity: Rarity,
    },
    MatchWon {
        match_id: String,
        own_score: u64,
        opponent_score: u64,
    },
    MatchLost {
        match_id: String,
        own_score: u64,
        opponent_score: u64,
    },
    Error {
        #[serde(skip)]
        purpose: SubscriptionPurpose,
        message: String,
    },
}

impl StreamNotice {
    /// Notice for `address` about `event`, if the event concerns it
    pub fn for_address(event: &GameEvent, address: &str) -> Option<Self> {
        if !event.concerns(address) {
            return None;
        }

        let notice = match event {
            GameEvent::ScoreUpdate(e) => StreamNotice::ScoreUpdated {
                score: e.score,
                previous_score: e.previous_score,
            },
            GameEvent::RankChange(e) => StreamNotice::RankChanged {
                new_rank: e.new_rank,
                direction: e.direction,
            },
            GameEvent::AchievementUnlocked(e) => StreamNotice::AchievementUnlocked {
                name: e.achievement_name.clone(),
                rarity: e.rarity,
            },
            GameEvent::MatchResult(e) => {
                let (own_score, opponent_score) = if e.player1_address.eq_ignore_ascii_case(address) {
                    (e.player1_score, e.player2_score)
                } else {
                    (e.player2_score, e.player1_score)
                };
                if e.is_winner(address) {
                    StreamNotice::MatchWon {
                        match_id: e.match_id.clone(),
                        own_score,
                        opponent_score,
                    }
                } else {
                    StreamNotice::MatchLost {
                        match_id: e.match_id.clone(),
                        own_score,
                        opponent_score,
                    }
                }
            }
        };
        Some(notice)
    }

    pub fn error(purpose: &SubscriptionPurpose, err: &TransportError) -> Self {
        StreamNotice::Error {
            purpose: purpose.clone(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for StreamNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamNotice::ScoreUpdated {
                score,
                previous_score,
            } => write!(f, "Score updated: {} (was {})", score, previous_score),
            StreamNotice::RankChanged {
                new_rank,
                direction,
            } => write!(f, "Rank changed: #{} ({})", new_rank, direction),
            StreamNotice::AchievementUnlocked { name, rarity } => {
                write!(f, "Achievement unlocked: {} ({})", name, rarity)
            }
            StreamNotice::MatchWon {
                own_score,
                opponent_score,
                ..
            } => write!(f, "Match won {}-{}", own_score, opponent_score),
            StreamNotice::MatchLost {
                own_score,
                opponent_score,
                ..
            } => write!(f, "Match lost {}-{}", own_score, opponent_score),
            StreamNotice::Error { purpose, message } => {
                write!(f, "Stream error on {}: {}", purpose, message)
            }
        }
    }
}
