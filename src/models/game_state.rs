use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::game_event::GameEvent;
use super::player::{canonical_address, Player};
use super::tournament::{Tournament, TournamentStatus};

/// Player and tournament state folded from the event stream.
///
/// Consumers only ever see this through an `Arc` snapshot; the registry
/// replaces the whole value on every change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Keyed by lowercase wallet address
    pub players: HashMap<String, Player>,
    /// Keyed by tournament id
    pub tournaments: HashMap<String, Tournament>,
    pub last_event: Option<GameEvent>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive player lookup
    pub fn player(&self, address: &str) -> Option<&Player> {
        self.players.get(&canonical_address(address))
    }

    pub fn tournament(&self, id: &str) -> Option<&Tournament> {
        self.tournaments.get(id)
    }

    /// Players ordered by rank ascending, then score descending
    pub fn leaderboard(&self) -> Vec<&Player> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by(|a, b| {
            a.rank
                .cmp(&b.rank)
                .then_with(|| b.score.cmp(&a.score))
                .then_with(|| a.id.cmp(&b.id))
        });
        players
    }

    pub fn tournaments_with_status(&self, status: TournamentStatus) -> Vec<&Tournament> {
        let mut tournaments: Vec<&Tournament> = self
            .tournaments
            .values()
            .filter(|t| t.status == status)
            .collect();
        tournaments.sort_by(|a, b| a.id.cmp(&b.id));
        tournaments
    }
}
