//! Transport seam between the registry and the upstream data stream.
//!
//! A transport accepts a [`SubscriptionParams`] request and pushes payloads
//! through its callbacks until the returned handle is cancelled.
//! [`ReplayTransport`] feeds recorded payloads from JSON-lines files.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ReplayConfig;
use crate::models::subscription::{SubscriptionId, SubscriptionParams};
use crate::stream_error::TransportError;

#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a subscription. Payloads arrive through `params.on_data` in
    /// delivery order; failures after a successful subscribe arrive through
    /// `params.on_error`.
    async fn subscribe(
        &self,
        params: SubscriptionParams,
    ) -> Result<TransportSubscription, TransportError>;
}

type CancelFn = Box<dyn FnOnce() + Send>;

/// Live subscription held by the registry.
///
/// Dropping the handle does not cancel the subscription; call
/// [`TransportSubscription::cancel`].
pub struct TransportSubscription {
    id: SubscriptionId,
    cancel: Option<CancelFn>,
}

impl TransportSubscription {
    pub fn new(id: SubscriptionId, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for TransportSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Replays `<dir>/<context>.jsonl` files, one payload per line.
///
/// `:` in the context label becomes `_` in the file name, so the
/// `player:0xabc` context reads `player_0xabc.jsonl`.
pub struct ReplayTransport {
    dir: PathBuf,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ReplayTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn from_config(config: &ReplayConfig) -> Self {
        Self::new(&config.dir)
    }

    pub fn replay_path(&self, context: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", context.replace(':', "_")))
    }

    /// Wait until every replay started so far has delivered its last line
    /// or been cancelled.
    pub async fn wait_idle(&self) {
        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for task in tasks {
            // Cancelled replays finish with a JoinError
            let _ = task.await;
        }
    }
}

#[async_trait]
impl StreamTransport for ReplayTransport {
    async fn subscribe(
        &self,
        params: SubscriptionParams,
    ) -> Result<TransportSubscription, TransportError> {
        let path = self.replay_path(&params.context);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => TransportError::SubscriptionRejected(format!(
                    "no replay file for context '{}' at {}",
                    params.context,
                    path.display()
                )),
                _ => TransportError::from(err),
            })?;

        let id = SubscriptionId(Uuid::new_v4().to_string());
        info!(
            subscription_id = %id,
            context = %params.context,
            path = %path.display(),
            "Starting replay"
        );

        let task_id = id.clone();
        let task = tokio::spawn(async move {
            let mut delivered = 0usize;
            for (index, line) in contents.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match serde_json::from_str::<Value>(line) {
                    Ok(payload) => {
                        (params.on_data)(payload);
                        delivered += 1;
                    }
                    Err(err) => (params.on_error)(TransportError::MalformedPayload(format!(
                        "line {}: {}",
                        index + 1,
                        err
                    ))),
                }

                tokio::task::yield_now().await;
            }
            debug!(subscription_id = %task_id, delivered, "Replay finished");
        });

        let abort = task.abort_handle();
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task);

        Ok(TransportSubscription::new(id, move || abort.abort()))
    }
}
