//! Subscription registry and state owner.
//!
//! The registry keeps at most one live subscription per
//! [`SubscriptionPurpose`], folds every admitted event into [`GameState`]
//! and publishes the result as an immutable snapshot. All writes go through
//! the watch channel's `send_modify`, so reductions from different purposes
//! are serialised.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use validator::Validate;

use crate::config::StreamConfig;
use crate::models::game_event::GameEvent;
use crate::models::game_state::GameState;
use crate::models::notice::StreamNotice;
use crate::models::player::canonical_address;
use crate::models::subscription::{
    Subscription, SubscriptionId, SubscriptionParams, SubscriptionPurpose,
};
use crate::models::tournament::Tournament;
use crate::stream_error::{StreamError, TransportError};

use super::classifier::describe;
use super::event_transformer::EventTransformer;
use super::state_reducer::apply_event;
use super::stream_transport::{StreamTransport, TransportSubscription};

const NOTICE_CAPACITY: usize = 64;

enum GateState {
    /// Subscribe still in flight; payloads are held in arrival order
    Pending(Vec<Value>),
    Open,
    Closed,
}

/// Admits one subscription's payloads into the state.
///
/// Payloads delivered while the transport subscribe is still running are
/// held until the subscription is registered, then applied once. A
/// subscription that loses a same-purpose race is closed and its held
/// payloads are discarded. The lock is held while a payload is applied, so
/// one subscription's payloads are folded strictly in delivery order.
struct DeliveryGate {
    state: Mutex<GateState>,
}

impl DeliveryGate {
    fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Pending(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, shared: &Shared, purpose: &SubscriptionPurpose, payload: Value) {
        let mut state = self.lock();
        match &mut *state {
            GateState::Pending(held) => held.push(payload),
            GateState::Open => shared.handle_payload(purpose, payload),
            GateState::Closed => {}
        }
    }

    /// Apply held payloads and pass later ones straight through. No-op once
    /// closed.
    fn open(&self, shared: &Shared, purpose: &SubscriptionPurpose) {
        let mut state = self.lock();
        if let GateState::Pending(held) = &mut *state {
            let held = std::mem::take(held);
            *state = GateState::Open;
            if !held.is_empty() {
                debug!(purpose = %purpose, count = held.len(), "Applying payloads held during subscribe");
            }
            for payload in held {
                shared.handle_payload(purpose, payload);
            }
        }
    }

    fn close(&self) {
        *self.lock() = GateState::Closed;
    }

    fn is_closed(&self) -> bool {
        matches!(*self.lock(), GateState::Closed)
    }
}

struct ActiveSubscription {
    handle: TransportSubscription,
    gate: Arc<DeliveryGate>,
}

impl ActiveSubscription {
    /// Close the gate before cancelling so nothing is applied after removal
    fn release(self) {
        self.gate.close();
        self.handle.cancel();
    }
}

/// State and channels shared with the transport callbacks
struct Shared {
    state: watch::Sender<Arc<GameState>>,
    notices: broadcast::Sender<StreamNotice>,
    transformer: EventTransformer,
    watch_address: Option<String>,
}

pub struct StreamRegistry<T: StreamTransport> {
    transport: T,
    config: StreamConfig,
    shared: Arc<Shared>,
    subscriptions: Mutex<HashMap<SubscriptionPurpose, ActiveSubscription>>,
}

impl<T: StreamTransport> StreamRegistry<T> {
    pub fn new(transport: T, config: StreamConfig) -> Self {
        Self::with_transformer(transport, config, EventTransformer::default())
    }

    pub fn with_transformer(transport: T, config: StreamConfig, transformer: EventTransformer) -> Self {
        let (state, _) = watch::channel(Arc::new(GameState::new()));
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let watch_address = config.watch_address.as_deref().map(canonical_address);

        Self {
            transport,
            config,
            shared: Arc::new(Shared {
                state,
                notices,
                transformer,
                watch_address,
            }),
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // =========================================================================
    // SUBSCRIBE / UNSUBSCRIBE
    // =========================================================================

    /// Subscribe for `purpose`.
    ///
    /// Idempotent: if the purpose already has a live subscription its handle
    /// is returned and the transport is not contacted.
    pub async fn subscribe(&self, purpose: SubscriptionPurpose) -> Result<Subscription, StreamError> {
        let purpose = purpose.canonical();
        validate_purpose(&purpose)?;

        if let Some(existing) = self.existing(&purpose) {
            debug!(purpose = %purpose, subscription_id = %existing.id, "Already subscribed");
            return Ok(existing);
        }

        let gate = Arc::new(DeliveryGate::new());
        let params = self.params_for(&purpose, gate.clone());

        let handle = self.transport.subscribe(params).await.map_err(|e| {
            error!(purpose = %purpose, error = %e, "Subscribe failed");
            StreamError::from(e)
        })?;

        let mut subscriptions = self.lock_subscriptions();
        if let Some(existing) = subscriptions.get(&purpose) {
            // Another caller won the race while the transport was busy
            let existing = Subscription {
                id: existing.handle.id().clone(),
                purpose: purpose.clone(),
            };
            drop(subscriptions);
            ActiveSubscription { handle, gate }.release();
            return Ok(existing);
        }

        let subscription = Subscription {
            id: handle.id().clone(),
            purpose: purpose.clone(),
        };
        subscriptions.insert(
            purpose.clone(),
            ActiveSubscription {
                handle,
                gate: gate.clone(),
            },
        );
        drop(subscriptions);
        gate.open(&self.shared, &purpose);

        info!(
            purpose = %purpose,
            subscription_id = %subscription.id,
            "Subscribed to stream"
        );
        Ok(subscription)
    }

    /// Subscribe to the leaderboard and to all tournaments
    pub async fn subscribe_defaults(&self) -> Result<Vec<Subscription>, StreamError> {
        let leaderboard = self.subscribe(SubscriptionPurpose::Leaderboard).await?;
        let tournaments = self.subscribe(SubscriptionPurpose::AllTournaments).await?;
        Ok(vec![leaderboard, tournaments])
    }

    /// Remove the subscription with `id`. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: &SubscriptionId) {
        let removed = {
            let mut subscriptions = self.lock_subscriptions();
            let purpose = subscriptions
                .iter()
                .find(|(_, active)| active.handle.id() == id)
                .map(|(purpose, _)| purpose.clone());
            purpose.and_then(|p| subscriptions.remove(&p).map(|active| (p, active)))
        };

        match removed {
            Some((purpose, active)) => {
                active.release();
                info!(purpose = %purpose, subscription_id = %id, "Unsubscribed from stream");
            }
            None => debug!(subscription_id = %id, "Unsubscribe for unknown subscription ignored"),
        }
    }

    /// Remove the subscription for `purpose`; `false` if there was none
    pub fn unsubscribe_purpose(&self, purpose: &SubscriptionPurpose) -> bool {
        let purpose = purpose.canonical();
        let removed = self.lock_subscriptions().remove(&purpose);
        match removed {
            Some(active) => {
                let id = active.handle.id().clone();
                active.release();
                info!(purpose = %purpose, subscription_id = %id, "Unsubscribed from stream");
                true
            }
            None => false,
        }
    }

    pub fn unsubscribe_all(&self) {
        let drained: Vec<(SubscriptionPurpose, ActiveSubscription)> =
            self.lock_subscriptions().drain().collect();
        let count = drained.len();
        for (_, active) in drained {
            active.release();
        }
        info!(count, "Unsubscribed from all streams");
    }

    // =========================================================================
    // STATUS AND SNAPSHOTS
    // =========================================================================

    pub fn is_subscribed(&self) -> bool {
        !self.lock_subscriptions().is_empty()
    }

    pub fn is_active(&self, purpose: &SubscriptionPurpose) -> bool {
        self.lock_subscriptions().contains_key(&purpose.canonical())
    }

    /// Live purposes ordered by their display label
    pub fn active_purposes(&self) -> Vec<SubscriptionPurpose> {
        let mut purposes: Vec<SubscriptionPurpose> =
            self.lock_subscriptions().keys().cloned().collect();
        purposes.sort_by_key(|p| p.to_string());
        purposes
    }

    /// Current state. Cheap; the snapshot is shared, never copied.
    pub fn snapshot(&self) -> Arc<GameState> {
        self.shared.state.borrow().clone()
    }

    /// Receiver that is marked changed whenever a new snapshot is published
    pub fn watch(&self) -> watch::Receiver<Arc<GameState>> {
        self.shared.state.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<StreamNotice> {
        self.shared.notices.subscribe()
    }

    fn existing(&self, purpose: &SubscriptionPurpose) -> Option<Subscription> {
        self.lock_subscriptions()
            .get(purpose)
            .map(|active| Subscription {
                id: active.handle.id().clone(),
                purpose: purpose.clone(),
            })
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, HashMap<SubscriptionPurpose, ActiveSubscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn params_for(&self, purpose: &SubscriptionPurpose, gate: Arc<DeliveryGate>) -> SubscriptionParams {
        let stream_event_id = match purpose {
            SubscriptionPurpose::Leaderboard | SubscriptionPurpose::Player(_) => {
                self.config.leaderboard_event_id.clone()
            }
            SubscriptionPurpose::Tournament(_) | SubscriptionPurpose::AllTournaments => {
                self.config.tournament_event_id.clone()
            }
        };

        let data_shared = self.shared.clone();
        let data_purpose = purpose.clone();
        let data_gate = gate.clone();
        let error_shared = self.shared.clone();
        let error_purpose = purpose.clone();

        SubscriptionParams {
            stream_event_id,
            eth_calls: Vec::new(),
            context: purpose.context(),
            only_push_changes: self.config.only_push_changes,
            on_data: Arc::new(move |payload| {
                data_gate.deliver(&data_shared, &data_purpose, payload);
            }),
            on_error: Arc::new(move |err| {
                if !gate.is_closed() {
                    error_shared.handle_error(&error_purpose, err);
                }
            }),
        }
    }
}

impl<T: StreamTransport> Drop for StreamRegistry<T> {
    fn drop(&mut self) {
        let drained: Vec<ActiveSubscription> = self
            .lock_subscriptions()
            .drain()
            .map(|(_, active)| active)
            .collect();
        for active in drained {
            active.release();
        }
    }
}

fn validate_purpose(purpose: &SubscriptionPurpose) -> Result<(), StreamError> {
    match purpose {
        SubscriptionPurpose::Player(address) if address.trim().is_empty() => Err(
            StreamError::InvalidPurpose("player address is empty".to_string()),
        ),
        SubscriptionPurpose::Tournament(id) if id.trim().is_empty() => Err(
            StreamError::InvalidPurpose("tournament id is empty".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Whether an event delivered for `purpose` belongs in its scope
pub fn admits(purpose: &SubscriptionPurpose, event: &GameEvent) -> bool {
    match purpose {
        SubscriptionPurpose::Leaderboard => true,
        // Match results reach state through the leaderboard and tournament
        // streams only
        SubscriptionPurpose::Player(address) => event
            .player_address()
            .is_some_and(|player| player.eq_ignore_ascii_case(address)),
        SubscriptionPurpose::Tournament(id) => matches!(
            event,
            GameEvent::MatchResult(m) if m.tournament_id.as_deref() == Some(id.as_str())
        ),
        SubscriptionPurpose::AllTournaments => matches!(event, GameEvent::MatchResult(_)),
    }
}

/// Tournament snapshots carried by a payload for a tournament purpose.
///
/// A snapshot is an object with `id` and `status` and no `type`, either the
/// payload itself or an element of a top-level array. Snapshots that fail
/// to parse or validate are skipped.
fn tournament_snapshots(purpose: &SubscriptionPurpose, payload: &Value) -> Vec<Tournament> {
    let wanted: Option<&str> = match purpose {
        SubscriptionPurpose::Tournament(id) => Some(id.as_str()),
        SubscriptionPurpose::AllTournaments => None,
        _ => return Vec::new(),
    };

    let candidates: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    candidates
        .into_iter()
        .filter(|value| is_tournament_shaped(value))
        .filter_map(|value| match serde_json::from_value::<Tournament>(value.clone()) {
            Ok(tournament) => match tournament.validate() {
                Ok(()) => Some(tournament),
                Err(e) => {
                    warn!(purpose = %purpose, error = %e, "Ignoring invalid tournament snapshot");
                    None
                }
            },
            Err(e) => {
                warn!(purpose = %purpose, error = %e, "Ignoring malformed tournament snapshot");
                None
            }
        })
        .filter(|tournament| wanted.map_or(true, |id| tournament.id == id))
        .collect()
}

fn is_tournament_shaped(value: &Value) -> bool {
    value.as_object().is_some_and(|obj| {
        obj.contains_key("id") && obj.contains_key("status") && !obj.contains_key("type")
    })
}

impl Shared {
    fn handle_payload(&self, purpose: &SubscriptionPurpose, payload: Value) {
        debug!(purpose = %purpose, "Received payload");

        let extracted = self.transformer.events(&payload);
        let snapshots = tournament_snapshots(purpose, &payload);
        if extracted.is_empty() && snapshots.is_empty() {
            warn!(
                purpose = %purpose,
                payload = %describe(&payload),
                "Payload produced no events"
            );
            return;
        }

        let events: Vec<GameEvent> = extracted
            .into_iter()
            .filter(|event| admits(purpose, event))
            .collect();
        if events.is_empty() && snapshots.is_empty() {
            debug!(purpose = %purpose, "No events in scope");
            return;
        }

        self.state.send_modify(|current| {
            let mut next = (**current).clone();
            for tournament in &snapshots {
                next.tournaments.insert(tournament.id.clone(), tournament.clone());
            }
            for event in &events {
                next = apply_event(next, event);
                next.last_event = Some(event.clone());
            }
            *current = Arc::new(next);
        });

        debug!(
            purpose = %purpose,
            events = events.len(),
            tournaments = snapshots.len(),
            "Applied payload"
        );

        if let Some(address) = &self.watch_address {
            for notice in events
                .iter()
                .filter_map(|event| StreamNotice::for_address(event, address))
            {
                info!(notice = %notice, "Notice for watched wallet");
                // No receivers is fine
                let _ = self.notices.send(notice);
            }
        }
    }

    fn handle_error(&self, purpose: &SubscriptionPurpose, err: TransportError) {
        error!(purpose = %purpose, error = %err, "Stream transport error");
        let _ = self.notices.send(StreamNotice::error(purpose, &err));
    }
}
