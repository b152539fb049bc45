//! Folds game events into [`GameState`].
//!
//! The reducer takes the state by value and returns the next one, so a
//! snapshot held elsewhere is never touched. Player map keys are lowercase;
//! stored wallet addresses keep the casing of the first event that created
//! the record.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::models::game_event::{GameEvent, MatchResultEvent};
use crate::models::game_state::GameState;
use crate::models::player::{canonical_address, Achievement, Player, PlayerUpdate};

/// Apply `event`, stamping touched players with the current time
pub fn apply_event(state: GameState, event: &GameEvent) -> GameState {
    apply_event_at(state, event, Utc::now())
}

pub fn apply_event_at(mut state: GameState, event: &GameEvent, now: DateTime<Utc>) -> GameState {
    trace!(event_type = event.type_tag(), "Applying event");

    match event {
        GameEvent::ScoreUpdate(e) => {
            upsert_player(
                &mut state,
                &e.player_address,
                |_| PlayerUpdate {
                    score: Some(e.score),
                    ..Default::default()
                },
                now,
            );
        }
        GameEvent::RankChange(e) => {
            upsert_player(
                &mut state,
                &e.player_address,
                |_| PlayerUpdate {
                    rank: Some(e.new_rank),
                    rank_change: Some(e.direction),
                    ..Default::default()
                },
                now,
            );
        }
        GameEvent::AchievementUnlocked(e) => {
            upsert_player(
                &mut state,
                &e.player_address,
                |_| PlayerUpdate {
                    new_achievements: vec![Achievement::from(e)],
                    ..Default::default()
                },
                now,
            );
        }
        GameEvent::MatchResult(e) => apply_match_result(&mut state, e, now),
    }

    state
}

fn apply_match_result(state: &mut GameState, result: &MatchResultEvent, now: DateTime<Utc>) {
    let mut players = vec![&result.player1_address];
    // A self-match counts once
    if canonical_address(&result.player2_address) != canonical_address(&result.player1_address) {
        players.push(&result.player2_address);
    }

    for address in players {
        let won = result.is_winner(address);
        upsert_player(
            state,
            address,
            |player| {
                if won {
                    PlayerUpdate {
                        wins: Some(player.wins + 1),
                        ..Default::default()
                    }
                } else {
                    PlayerUpdate {
                        losses: Some(player.losses + 1),
                        ..Default::default()
                    }
                }
            },
            now,
        );
    }

    let Some(tournament_id) = result.tournament_id.as_deref() else {
        return;
    };
    let Some(bracket) = state
        .tournaments
        .get_mut(tournament_id)
        .and_then(|t| t.bracket.as_mut())
    else {
        return;
    };

    if !bracket.record_result(result) {
        debug!(
            tournament_id = tournament_id,
            match_id = %result.match_id,
            "Match result has no bracket entry"
        );
    }
}

/// Merge an update into the player at `address`, creating a placeholder
/// record first if the address is new.
fn upsert_player<F>(state: &mut GameState, address: &str, update: F, now: DateTime<Utc>)
where
    F: FnOnce(&Player) -> PlayerUpdate,
{
    let key = canonical_address(address);
    let player = state
        .players
        .remove(&key)
        .unwrap_or_else(|| Player::placeholder(address));
    let update = update(&player);
    state.players.insert(key, player.merged(update, now));
}
