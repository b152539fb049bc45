use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::stream_error::TransportError;

use super::player::canonical_address;

/// Logical scope a subscription is registered under.
///
/// At most one live subscription exists per purpose. Player addresses are
/// compared in canonical (lowercase) form, see [`SubscriptionPurpose::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionPurpose {
    Leaderboard,
    Player(String),
    Tournament(String),
    AllTournaments,
}

impl SubscriptionPurpose {
    pub fn player(address: &str) -> Self {
        SubscriptionPurpose::Player(canonical_address(address))
    }

    pub fn tournament(id: &str) -> Self {
        SubscriptionPurpose::Tournament(id.to_string())
    }

    /// Same purpose with the player address lowercased
    pub fn canonical(&self) -> Self {
        match self {
            SubscriptionPurpose::Player(address) => SubscriptionPurpose::player(address),
            other => other.clone(),
        }
    }

    /// Context label handed to the transport with the subscribe request
    pub fn context(&self) -> String {
        match self {
            SubscriptionPurpose::Leaderboard => "leaderboard".to_string(),
            SubscriptionPurpose::Player(address) => format!("player:{}", address),
            SubscriptionPurpose::Tournament(id) => format!("tournament:{}", id),
            SubscriptionPurpose::AllTournaments => "tournaments".to_string(),
        }
    }
}

impl std::fmt::Display for SubscriptionPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionPurpose::Leaderboard => write!(f, "leaderboard"),
            SubscriptionPurpose::Player(address) => write!(f, "player:{}", address),
            SubscriptionPurpose::Tournament(id) => write!(f, "tournament:{}", id),
            SubscriptionPurpose::AllTournaments => write!(f, "all-tournaments"),
        }
    }
}

/// Opaque subscription id assigned by the transport
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle returned to callers of `subscribe`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub purpose: SubscriptionPurpose,
}

/// Read-call to run alongside a subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthCall {
    pub to: String,
    pub data: String,
}

pub type DataCallback = Arc<dyn Fn(Value) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(TransportError) + Send + Sync>;

/// Subscribe request handed to the transport
#[derive(Clone)]
pub struct SubscriptionParams {
    /// Upstream stream identifier; `None` lets the transport pick its default
    pub stream_event_id: Option<String>,
    pub eth_calls: Vec<EthCall>,
    pub context: String,
    /// Push only changed values instead of every tick
    pub only_push_changes: bool,
    pub on_data: DataCallback,
    pub on_error: ErrorCallback,
}

impl std::fmt::Debug for SubscriptionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionParams")
            .field("stream_event_id", &self.stream_event_id)
            .field("eth_calls", &self.eth_calls)
            .field("context", &self.context)
            .field("only_push_changes", &self.only_push_changes)
            .finish_non_exhaustive()
    }
}
