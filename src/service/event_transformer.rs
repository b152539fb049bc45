use serde_json::Value;
use tracing::debug;

use crate::models::game_event::GameEvent;

use super::classifier::{classify, Classified};
use super::log_decoder::LogDecoder;

/// Events extracted from one payload
#[derive(Debug, Clone, PartialEq)]
pub enum Transformed {
    Single(GameEvent),
    Many(Vec<GameEvent>),
}

impl Transformed {
    pub fn into_events(self) -> Vec<GameEvent> {
        match self {
            Transformed::Single(event) => vec![event],
            Transformed::Many(events) => events,
        }
    }
}

/// Turns classified payloads into game events, decoding raw logs on the way
#[derive(Debug, Clone, Default)]
pub struct EventTransformer {
    decoder: LogDecoder,
}

impl EventTransformer {
    pub fn new(decoder: LogDecoder) -> Self {
        Self { decoder }
    }

    /// Extract events from a payload.
    ///
    /// Typed events pass through unchanged. In an array, typed events come
    /// first, followed by the raw logs that decode; logs that do not decode
    /// are dropped. `None` when nothing could be extracted, including for an
    /// empty array.
    pub fn transform(&self, payload: &Value) -> Option<Transformed> {
        match classify(payload) {
            Classified::DomainEvent(event) => Some(Transformed::Single(event)),
            Classified::RawLog(log) => self.decoder.decode(&log).map(Transformed::Single),
            Classified::Array(items) => {
                let mut events = Vec::new();
                let mut logs = Vec::new();
                for item in items {
                    match item {
                        Classified::DomainEvent(event) => events.push(event),
                        Classified::RawLog(log) => logs.push(log),
                        _ => {}
                    }
                }

                let log_count = logs.len();
                let typed_count = events.len();
                events.extend(logs.iter().filter_map(|log| self.decoder.decode(log)));
                debug!(
                    typed = typed_count,
                    logs = log_count,
                    decoded = events.len() - typed_count,
                    "Transformed payload array"
                );

                if events.is_empty() {
                    None
                } else {
                    Some(Transformed::Many(events))
                }
            }
            Classified::Unknown => None,
        }
    }

    /// Same as [`EventTransformer::transform`], flattened into a list
    pub fn events(&self, payload: &Value) -> Vec<GameEvent> {
        self.transform(payload)
            .map(Transformed::into_events)
            .unwrap_or_default()
    }
}
