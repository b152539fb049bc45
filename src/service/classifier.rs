//! Payload classification
//!
//! Sorts inbound stream payloads into typed game events, raw logs, one-level
//! arrays of those, or unknown values. Classification is shape-only; nothing
//! here decodes log contents.

use serde_json::Value;

use crate::models::game_event::GameEvent;
use crate::models::raw_log::RawLogEvent;

/// Outcome of classifying a payload
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Unknown,
    DomainEvent(GameEvent),
    RawLog(RawLogEvent),
    /// Element-wise classification of a top-level array. Elements are never
    /// `Array`; a nested array is reported as `Unknown`.
    Array(Vec<Classified>),
}

impl Classified {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Classified::Unknown)
    }
}

/// Classify a payload, looking one level into arrays
pub fn classify(payload: &Value) -> Classified {
    match payload {
        Value::Array(items) => Classified::Array(items.iter().map(classify_item).collect()),
        other => classify_item(other),
    }
}

fn classify_item(payload: &Value) -> Classified {
    if let Some(event) = domain_event(payload) {
        return Classified::DomainEvent(event);
    }
    if let Some(log) = RawLogEvent::from_value(payload) {
        return Classified::RawLog(log);
    }
    Classified::Unknown
}

/// A typed game event, if `payload` carries a recognised `type` tag and its
/// body deserialises into that variant.
pub fn domain_event(payload: &Value) -> Option<GameEvent> {
    let tag = payload.get("type")?.as_str()?;
    if !GameEvent::is_type_tag(tag) {
        return None;
    }
    serde_json::from_value(payload.clone()).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Null,
    Scalar,
    Object,
    Array,
    DomainEvent,
    RawLog,
}

impl std::fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadKind::Null => write!(f, "null"),
            PayloadKind::Scalar => write!(f, "scalar"),
            PayloadKind::Object => write!(f, "object"),
            PayloadKind::Array => write!(f, "array"),
            PayloadKind::DomainEvent => write!(f, "domain-event"),
            PayloadKind::RawLog => write!(f, "raw-log"),
        }
    }
}

/// Short diagnostic description of a payload, for log lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSummary {
    pub kind: PayloadKind,
    /// `type` tag of a domain event
    pub event_type: Option<&'static str>,
    /// Top-level keys of an object payload
    pub keys: Vec<String>,
    /// Element count of an array payload
    pub len: Option<usize>,
    /// Kind of the first array element
    pub first_item: Option<PayloadKind>,
}

impl std::fmt::Display for PayloadSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(event_type) = self.event_type {
            write!(f, " type={}", event_type)?;
        }
        if !self.keys.is_empty() {
            write!(f, " keys=[{}]", self.keys.join(","))?;
        }
        if let Some(len) = self.len {
            write!(f, " len={}", len)?;
        }
        if let Some(first) = self.first_item {
            write!(f, " first={}", first)?;
        }
        Ok(())
    }
}

/// Summarise a payload. Arrays are described by their length and the kind
/// of their first element only.
pub fn describe(payload: &Value) -> PayloadSummary {
    match payload {
        Value::Array(items) => PayloadSummary {
            kind: PayloadKind::Array,
            event_type: None,
            keys: Vec::new(),
            len: Some(items.len()),
            first_item: items.first().map(item_kind),
        },
        other => {
            let event_type = domain_event(other).map(|e| e.type_tag());
            let keys = other
                .as_object()
                .map(|obj| obj.keys().cloned().collect())
                .unwrap_or_default();
            PayloadSummary {
                kind: item_kind(other),
                event_type,
                keys,
                len: None,
                first_item: None,
            }
        }
    }
}

fn item_kind(value: &Value) -> PayloadKind {
    match value {
        Value::Null => PayloadKind::Null,
        Value::Array(_) => PayloadKind::Array,
        Value::Object(_) => match classify_item(value) {
            Classified::DomainEvent(_) => PayloadKind::DomainEvent,
            Classified::RawLog(_) => PayloadKind::RawLog,
            _ => PayloadKind::Object,
        },
        _ => PayloadKind::Scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score_update_json() -> Value {
        json!({
            "type": "scoreUpdate",
            "playerAddress": "0xAbC",
            "score": 1500,
            "previousScore": 1200,
            "timestamp": "2024-01-01T00:00:00Z"
        })
    }

    fn raw_log_json() -> Value {
        json!({
            "subscription": "0x1",
            "result": {
                "address": "0x00000000000000000000000000000000000000aa",
                "topics": [],
                "data": "0x"
            }
        })
    }

    #[test]
    fn test_classify_domain_event() {
        match classify(&score_update_json()) {
            Classified::DomainEvent(GameEvent::ScoreUpdate(e)) => {
                assert_eq!(e.player_address, "0xAbC");
                assert_eq!(e.score, 1500);
            }
            other => panic!("Expected DomainEvent, got {:?}", other),
        }
    }

    #[test]
    fn test_classification_is_idempotent() {
        let first = classify(&score_update_json());
        let event = match &first {
            Classified::DomainEvent(event) => event.clone(),
            other => panic!("Expected DomainEvent, got {:?}", other),
        };

        let again = classify(&serde_json::to_value(&event).unwrap());
        assert_eq!(again, first);
    }

    #[test]
    fn test_classify_raw_log() {
        assert!(matches!(classify(&raw_log_json()), Classified::RawLog(_)));
    }

    #[test]
    fn test_unknown_payloads() {
        assert!(classify(&json!({ "foo": 1 })).is_unknown());
        assert!(classify(&json!(null)).is_unknown());
        assert!(classify(&json!("scoreUpdate")).is_unknown());
        // Tournament snapshots are not recognised here
        assert!(classify(&json!({ "id": "t1", "status": "live" })).is_unknown());
    }

    #[test]
    fn test_recognised_tag_with_bad_body_is_unknown() {
        let payload = json!({ "type": "scoreUpdate", "playerAddress": "0xabc" });
        assert!(classify(&payload).is_unknown());
        assert!(classify(&json!({ "type": "tournamentUpdate" })).is_unknown());
    }

    #[test]
    fn test_classify_array_one_level() {
        let payload = json!([score_update_json(), raw_log_json(), { "foo": 1 }, [score_update_json()]]);

        match classify(&payload) {
            Classified::Array(items) => {
                assert_eq!(items.len(), 4);
                assert!(matches!(items[0], Classified::DomainEvent(_)));
                assert!(matches!(items[1], Classified::RawLog(_)));
                assert!(items[2].is_unknown());
                assert!(items[3].is_unknown());
            }
            other => panic!("Expected Array, got {:?}", other),
        }
    }

    #[test]
    fn test_describe_payloads() {
        let summary = describe(&score_update_json());
        assert_eq!(summary.kind, PayloadKind::DomainEvent);
        assert_eq!(summary.event_type, Some("scoreUpdate"));

        let summary = describe(&json!({ "foo": 1, "bar": 2 }));
        assert_eq!(summary.kind, PayloadKind::Object);
        assert_eq!(summary.keys.len(), 2);
        assert!(summary.to_string().starts_with("object keys=["));

        let summary = describe(&json!([[raw_log_json()], 1]));
        assert_eq!(summary.kind, PayloadKind::Array);
        assert_eq!(summary.len, Some(2));
        assert_eq!(summary.first_item, Some(PayloadKind::Array));
        assert_eq!(summary.to_string(), "array len=2 first=array");

        let summary = describe(&json!([raw_log_json()]));
        assert_eq!(summary.first_item, Some(PayloadKind::RawLog));

        assert_eq!(describe(&json!(42)).to_string(), "scalar");
    }
}
