use serde::{Deserialize, Serialize};
use validator::Validate;

use super::game_event::MatchResultEvent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    Upcoming,
    Live,
    Completed,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Upcoming => write!(f, "upcoming"),
            TournamentStatus::Live => write!(f, "live"),
            TournamentStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::InProgress => write!(f, "in-progress"),
            MatchStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentMatch {
    pub match_id: String,
    pub player1_address: String,
    pub player2_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_address: Option<String>,
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1_score: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_score: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRound {
    pub round_number: u32,
    #[serde(default)]
    pub matches: Vec<TournamentMatch>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TournamentBracket {
    #[serde(default)]
    pub rounds: Vec<TournamentRound>,
}

impl TournamentBracket {
    /// Record a finished match on the bracket entry with the same match id.
    ///
    /// Returns `false` when no entry carries that id.
    pub fn record_result(&mut self, result: &MatchResultEvent) -> bool {
        let entry = self
            .rounds
            .iter_mut()
            .flat_map(|round| round.matches.iter_mut())
            .find(|m| m.match_id == result.match_id);

        match entry {
            Some(entry) => {
                entry.winner_address = Some(result.winner_address.clone());
                entry.status = MatchStatus::Completed;
                entry.player1_score = Some(result.player1_score);
                entry.player2_score = Some(result.player2_score);
                true
            }
            None => false,
        }
    }

    pub fn find_match(&self, match_id: &str) -> Option<&TournamentMatch> {
        self.rounds
            .iter()
            .flat_map(|round| round.matches.iter())
            .find(|m| m.match_id == match_id)
    }
}

/// Tournament snapshot as pushed by the stream.
///
/// Only `id` and `status` are required on the wire; the display fields
/// default to empty values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    #[validate(length(min = 1, max = 256))]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub status: TournamentStatus,
    #[serde(default)]
    pub participants: u32,
    #[serde(default)]
    pub max_participants: u32,
    #[serde(default)]
    pub prize_pool: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub game: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bracket: Option<TournamentBracket>,
}
