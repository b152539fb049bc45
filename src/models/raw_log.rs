use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unprocessed log delivered by the streaming transport.
///
/// `topics` and `data` are hex strings whose layout is inferred by the
/// decoder, never guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLogEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<String>,
    pub result: LogResult,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResult {
    pub address: String,
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<String>,
}

impl RawLogEvent {
    /// Build from a JSON payload if it has the raw log shape.
    ///
    /// The payload must carry a `result` (or top-level `subscription`) key and
    /// `result` must be an object with an `address` key and a `topics` array.
    /// Individual values are read leniently: non-string entries become empty
    /// strings so the decoder treats them as zero.
    pub fn from_value(payload: &Value) -> Option<Self> {
        let obj = payload.as_object()?;
        if !obj.contains_key("result") && !obj.contains_key("subscription") {
            return None;
        }

        let result = obj.get("result")?.as_object()?;
        if !result.contains_key("address") {
            return None;
        }
        let topics = result.get("topics")?.as_array()?;

        let text = |key: &str| result.get(key).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            subscription: obj
                .get("subscription")
                .and_then(Value::as_str)
                .map(str::to_string),
            result: LogResult {
                address: text("address").unwrap_or_default(),
                topics: topics
                    .iter()
                    .map(|t| t.as_str().unwrap_or_default().to_string())
                    .collect(),
                data: text("data").unwrap_or_default(),
                block_number: text("blockNumber"),
                transaction_hash: text("transactionHash"),
                log_index: text("logIndex"),
            },
        })
    }
}
