//! Webhook notifications for content changes.
//!
//! Handlers publish events onto a bounded in-process queue and return
//! immediately. A single background worker drains the queue and POSTs each
//! event to the configured endpoint. Delivery is best-effort: one attempt, no
//! retries, failures are logged and counted but never reach the caller.

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::WebhookConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
}

/// Body POSTed to the webhook: `{id, ...fields, action}`.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub action: Action,
}

impl WebhookEvent {
    pub fn new(id: i64, action: Action, fields: Map<String, Value>) -> Self {
        Self { id, fields, action }
    }

    pub fn deleted(id: i64) -> Self {
        Self::new(id, Action::Delete, Map::new())
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("endpoint answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Default)]
struct DeliveryCounters {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct DeliveryStats {
    pub enabled: bool,
    pub delivered: u64,
    pub failed: u64,
    pub dropped: u64,
}

/// Publishing side of the outbox. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Notifier {
    tx: Option<mpsc::Sender<WebhookEvent>>,
    counters: Arc<DeliveryCounters>,
}

impl Notifier {
    /// A notifier that accepts events and discards them.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            counters: Arc::default(),
        }
    }

    /// Start the delivery worker. Without a URL and token nothing is spawned.
    ///
    /// The worker exits once every clone of the returned notifier is dropped
    /// and the queue is empty; await the handle to flush on shutdown.
    pub fn spawn(config: &WebhookConfig, http: reqwest::Client) -> (Self, Option<JoinHandle<()>>) {
        let (url, token) = match (&config.url, &config.token) {
            (Some(url), Some(token)) => (url.clone(), token.clone()),
            _ => {
                info!("Webhook notifications disabled (WEBHOOK_URL or WEBHOOK_TOKEN not set)");
                return (Self::disabled(), None);
            }
        };

        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let counters = Arc::new(DeliveryCounters::default());
        let worker = WebhookWorker {
            url,
            token,
            http,
            timeout: Duration::from_secs(config.timeout_secs),
            counters: counters.clone(),
        };

        let handle = tokio::spawn(worker.run(rx));
        (Self { tx: Some(tx), counters }, Some(handle))
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Enqueue without waiting; a full or closed queue drops the event.
    pub fn publish(&self, event: WebhookEvent) {
        let Some(tx) = &self.tx else {
            debug!("Webhook disabled, skipping {:?} notification for {}", event.action, event.id);
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Webhook queue full, dropped {:?} notification for {}", event.action, event.id);
            }
            Err(TrySendError::Closed(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Webhook worker stopped, dropped {:?} notification for {}", event.action, event.id);
            }
        }
    }

    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            enabled: self.is_enabled(),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

struct WebhookWorker {
    url: String,
    token: String,
    http: reqwest::Client,
    timeout: Duration,
    counters: Arc<DeliveryCounters>,
}

impl WebhookWorker {
    async fn run(self, mut rx: mpsc::Receiver<WebhookEvent>) {
        info!("Webhook worker started for {}", self.url);
        while let Some(event) = rx.recv().await {
            match self.deliver(&event).await {
                Ok(()) => {
                    self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                    debug!("Webhook delivered: {:?} {}", event.action, event.id);
                }
                Err(e) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Webhook delivery failed for {:?} {}: {}", event.action, event.id, e);
                }
            }
        }
        info!("Webhook worker stopped");
    }

    async fn deliver(&self, event: &WebhookEvent) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .json(event)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }
}
