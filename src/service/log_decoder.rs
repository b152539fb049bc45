//! Heuristic log decoder
//!
//! The upstream stream carries no event-signature registry, so a raw log
//! cannot be decoded against a known ABI. Instead an ordered list of
//! patterns is tried, most specific first. Each pattern checks that enough
//! topics and data are present, decodes, and checks that the values are
//! plausible; the first pattern that accepts the log wins.
//!
//! The result is a best guess, not a verified ABI decode. Callers must treat
//! decoded events as lossy interpretations of the log.

use alloy_primitives::Address;
use alloy_sol_types::SolValue;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::models::game_event::{
    AchievementUnlockedEvent, GameEvent, MatchResultEvent, RankChangeEvent, Rarity,
    ScoreUpdateEvent,
};
use crate::models::raw_log::RawLogEvent;

use super::hex_words::{
    address_bytes, derived_score, derived_score_gap, format_address, hex_bytes, is_plausible_score,
    topic_to_address, word, word_to_address, word_to_u64, WORD,
};

/// Score substituted when a decoded score word is zero
pub const FALLBACK_SCORE: u64 = 1_000;
/// Gap between the fallback score and its previous score
pub const FALLBACK_SCORE_GAP: u64 = 100;
/// Minimum data length for the rank-change and match-result layouts
pub const THREE_WORD_LAYOUT_LEN: usize = 3 * WORD + 1;
/// Byte holding the rank direction in the rank-change layout
pub const RANK_DIRECTION_OFFSET: usize = 3 * WORD;

/// Source of achievement rarity.
///
/// Logs carry no rarity signal, so the decoder asks this source for one.
pub trait RaritySource: Send + Sync {
    fn pick(&self) -> Rarity;
}

/// Uniformly random rarity. This mirrors the stream's existing behaviour;
/// it is a placeholder and should be revisited once logs carry a rarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRarity;

impl RaritySource for UniformRarity {
    fn pick(&self) -> Rarity {
        let index = rand::thread_rng().gen_range(0..Rarity::ALL.len());
        Rarity::ALL[index]
    }
}

/// Always the same rarity
#[derive(Debug, Clone, Copy)]
pub struct FixedRarity(pub Rarity);

impl RaritySource for FixedRarity {
    fn pick(&self) -> Rarity {
        self.0
    }
}

/// Log fields prepared once and shared by every pattern
pub struct PreparedLog<'a> {
    pub contract: &'a str,
    pub topics: &'a [String],
    /// Decoded data; empty when the data field is missing or not hex
    pub data: Vec<u8>,
    pub transaction_hash: Option<&'a str>,
}

impl<'a> PreparedLog<'a> {
    pub fn new(event: &'a RawLogEvent) -> Self {
        let result = &event.result;
        Self {
            contract: &result.address,
            topics: &result.topics,
            data: hex_bytes(&result.data).unwrap_or_default(),
            transaction_hash: result.transaction_hash.as_deref(),
        }
    }

    fn topic_address(&self, index: usize) -> Address {
        topic_to_address(self.topics.get(index))
    }

    fn word_u64(&self, index: usize) -> Option<u64> {
        word(&self.data, index).map(word_to_u64)
    }

    fn word_address(&self, index: usize) -> Option<Address> {
        word(&self.data, index).map(word_to_address)
    }

    /// First of the leading `words` data words that is a plausible score
    fn plausible_score(&self, words: usize) -> Option<u64> {
        (0..words)
            .filter_map(|i| self.word_u64(i))
            .find(|v| is_plausible_score(*v))
    }
}

/// Per-call inputs that are not part of the log itself
pub struct DecodeContext<'a> {
    pub now: DateTime<Utc>,
    pub rarity: &'a dyn RaritySource,
}

/// One guard-and-decode step of the pattern chain
pub struct LogPattern {
    pub name: &'static str,
    pub decode: fn(&PreparedLog<'_>, &DecodeContext<'_>) -> Option<GameEvent>,
}

/// Pattern chain in priority order
pub const PATTERNS: [LogPattern; 7] = [
    LogPattern {
        name: "score_update",
        decode: decode_score_update,
    },
    LogPattern {
        name: "rank_change",
        decode: decode_rank_change,
    },
    LogPattern {
        name: "match_result",
        decode: decode_match_result,
    },
    LogPattern {
        name: "achievement_unlocked",
        decode: decode_achievement,
    },
    LogPattern {
        name: "two_topic_fallback",
        decode: decode_two_topic_fallback,
    },
    LogPattern {
        name: "data_scan_fallback",
        decode: decode_data_scan_fallback,
    },
    LogPattern {
        name: "contract_fallback",
        decode: decode_contract_fallback,
    },
];

/// Event decoded from a log together with the pattern that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    pub pattern: &'static str,
    pub event: GameEvent,
}

/// Turns raw logs into best-guess game events
#[derive(Clone)]
pub struct LogDecoder {
    rarity: Arc<dyn RaritySource>,
}

impl Default for LogDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogDecoder").finish_non_exhaustive()
    }
}

impl LogDecoder {
    pub fn new() -> Self {
        Self::with_rarity_source(Arc::new(UniformRarity))
    }

    pub fn with_rarity_source(rarity: Arc<dyn RaritySource>) -> Self {
        Self { rarity }
    }

    /// Decode a log, stamping the event with the current time
    pub fn decode(&self, event: &RawLogEvent) -> Option<GameEvent> {
        self.decode_at(event, Utc::now()).map(|decoded| decoded.event)
    }

    /// Run the pattern chain; the first pattern that accepts the log wins.
    pub fn decode_at(&self, event: &RawLogEvent, now: DateTime<Utc>) -> Option<DecodedLog> {
        let log = PreparedLog::new(event);
        let ctx = DecodeContext {
            now,
            rarity: self.rarity.as_ref(),
        };

        let decoded = PATTERNS.iter().find_map(|pattern| {
            (pattern.decode)(&log, &ctx).map(|event| DecodedLog {
                pattern: pattern.name,
                event,
            })
        });

        match &decoded {
            Some(d) => trace!(pattern = d.pattern, event_type = d.event.type_tag(), "Decoded log"),
            None => debug!(
                contract = log.contract,
                topics = log.topics.len(),
                data_len = log.data.len(),
                "No decode pattern matched log"
            ),
        }

        decoded
    }
}

fn score_update(
    player: String,
    score: u64,
    previous_score: u64,
    now: DateTime<Utc>,
) -> GameEvent {
    GameEvent::ScoreUpdate(ScoreUpdateEvent {
        player_address: player,
        score,
        previous_score,
        timestamp: now,
        game_id: None,
        tournament_id: None,
    })
}

/// Topics `[sig, player?]`, data `[score, previousScore]`. Without a player
/// topic the first data word is probed for an address.
fn decode_score_update(log: &PreparedLog<'_>, ctx: &DecodeContext<'_>) -> Option<GameEvent> {
    if log.topics.is_empty() || log.data.len() < 2 * WORD {
        return None;
    }

    let mut player = log.topic_address(1);
    if player.is_zero() {
        player = log.word_address(0)?;
    }
    if player.is_zero() {
        return None;
    }

    let score = log.word_u64(0)?;
    let previous = log.word_u64(1)?;
    if score == 0 && previous == 0 {
        return None;
    }

    let score = if score == 0 { FALLBACK_SCORE } else { score };
    let previous = if previous == 0 {
        score.saturating_sub(FALLBACK_SCORE_GAP)
    } else {
        previous
    };

    Some(score_update(format_address(&player), score, previous, ctx.now))
}

/// Topics `[sig, player]`, data `[newRank, previousRank, direction byte]`
fn decode_rank_change(log: &PreparedLog<'_>, ctx: &DecodeContext<'_>) -> Option<GameEvent> {
    if log.topics.len() < 2 || log.data.len() < THREE_WORD_LAYOUT_LEN {
        return None;
    }

    let new_rank = log.word_u64(0)?;
    let previous_rank = log.word_u64(1)?;
    if new_rank == 0 && previous_rank == 0 {
        return None;
    }

    let direction = log.data[RANK_DIRECTION_OFFSET].into();

    Some(GameEvent::RankChange(RankChangeEvent {
        player_address: format_address(&log.topic_address(1)),
        new_rank,
        previous_rank,
        timestamp: ctx.now,
        direction,
    }))
}

/// Topics `[sig, player1, player2]`, data `[winner, player1Score, player2Score]`
fn decode_match_result(log: &PreparedLog<'_>, ctx: &DecodeContext<'_>) -> Option<GameEvent> {
    if log.topics.len() < 3 || log.data.len() < THREE_WORD_LAYOUT_LEN {
        return None;
    }

    let player1 = log.topic_address(1);
    let player2 = log.topic_address(2);
    if player1.is_zero() || player2.is_zero() {
        return None;
    }

    let winner = log.word_address(0)?;
    let player1_score = log.word_u64(1)?;
    let player2_score = log.word_u64(2)?;

    let winner = if !winner.is_zero() {
        winner
    } else if player1_score > player2_score {
        player1
    } else {
        player2
    };

    let match_id = match log.transaction_hash {
        Some(hash) if !hash.is_empty() => {
            format!("match-{}", hash.chars().take(16).collect::<String>())
        }
        _ => format!("match-{}", ctx.now.timestamp_millis()),
    };

    Some(GameEvent::MatchResult(MatchResultEvent {
        match_id,
        player1_address: format_address(&player1),
        player2_address: format_address(&player2),
        winner_address: format_address(&winner),
        player1_score,
        player2_score,
        tournament_id: None,
        timestamp: ctx.now,
    }))
}

/// Topics `[sig, player, achievementId]`, data = ABI-encoded name
fn decode_achievement(log: &PreparedLog<'_>, ctx: &DecodeContext<'_>) -> Option<GameEvent> {
    if log.topics.len() < 3 || log.data.len() <= WORD {
        return None;
    }

    let id_topic = &log.topics[2];
    let achievement_id = if id_topic.is_empty() {
        format!("achievement-{}", ctx.now.timestamp_millis())
    } else {
        format!("achievement-{}", tail_chars(id_topic, 16))
    };

    let name = String::abi_decode(&log.data).unwrap_or_default();
    let name = if name.is_empty() {
        format!("Achievement {}", tail_chars(&achievement_id, 8))
    } else {
        name
    };

    Some(GameEvent::AchievementUnlocked(AchievementUnlockedEvent {
        player_address: format_address(&log.topic_address(1)),
        achievement_id,
        achievement_description: format!("Unlocked achievement: {}", name),
        achievement_name: name,
        rarity: ctx.rarity.pick(),
        timestamp: ctx.now,
    }))
}

/// Any log with an address in topic 1, e.g. token transfers
fn decode_two_topic_fallback(
    log: &PreparedLog<'_>,
    ctx: &DecodeContext<'_>,
) -> Option<GameEvent> {
    if log.topics.len() < 2 {
        return None;
    }

    let player = log.topic_address(1);
    if player.is_zero() {
        return None;
    }

    let score = log
        .plausible_score(1)
        .unwrap_or_else(|| derived_score(player.as_slice()));
    let previous = score.saturating_sub(derived_score_gap(player.as_slice()));

    Some(score_update(format_address(&player), score, previous, ctx.now))
}

/// Single-topic logs with addresses in the data, e.g. swaps
fn decode_data_scan_fallback(
    log: &PreparedLog<'_>,
    ctx: &DecodeContext<'_>,
) -> Option<GameEvent> {
    if log.topics.len() != 1 || log.data.len() < WORD {
        return None;
    }

    let player = (0..3)
        .filter_map(|i| log.word_address(i))
        .find(|candidate| {
            !candidate.is_zero() && !format_address(candidate).eq_ignore_ascii_case(log.contract)
        })?;

    let score = log
        .plausible_score(3)
        .unwrap_or_else(|| derived_score(player.as_slice()));
    let previous = score.saturating_sub(derived_score_gap(player.as_slice()));

    Some(score_update(format_address(&player), score, previous, ctx.now))
}

/// Last resort: attribute the log to its emitting contract
fn decode_contract_fallback(
    log: &PreparedLog<'_>,
    ctx: &DecodeContext<'_>,
) -> Option<GameEvent> {
    let bytes = address_bytes(log.contract)?;
    let score = derived_score(&bytes);
    let previous = score.saturating_sub(derived_score_gap(&bytes));

    Some(score_update(log.contract.to_string(), score, previous, ctx.now))
}

fn tail_chars(value: &str, count: usize) -> String {
    let skip = value.chars().count().saturating_sub(count);
    value.chars().skip(skip).collect()
}
