//! Telemetry transport seam and its in-process implementation.
//!
//! A [`TelemetrySource`] turns a topic name plus a handler into an owned
//! [`Subscription`]. Handlers run on a delivery thread owned by the source,
//! one payload at a time and in publish order.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, Weak,
    },
    thread::{self, JoinHandle},
};

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{OverlayError, Result},
    message::StatusMessage,
};

/// Topic the simulation publishes task status on.
pub const TASK_INFO_TOPIC: &str = "/vrx/task/info";

/// Callback invoked on the delivery thread with each raw payload.
pub type MessageHandler = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// Anything that can deliver raw payloads for a named topic.
pub trait TelemetrySource {
    /// Starts delivering payloads published on `topic` to `handler`.
    ///
    /// # Errors
    /// Returns an error if the topic name is invalid or delivery cannot start.
    fn subscribe(&self, topic: &str, handler: MessageHandler) -> Result<Subscription>;
}

/// Owned handle to a live subscription.
///
/// Unsubscribing (explicitly or by dropping the handle) detaches from the
/// source and waits for the delivery thread to finish, so no handler call
/// happens after it returns.
pub struct Subscription {
    topic: String,
    cancel: CancellationToken,
    detach: Option<Box<dyn FnOnce() + Send>>,
    worker: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Creates a new `Subscription`.
    ///
    /// # Arguments
    /// * `topic` - The subscribed topic name.
    /// * `cancel` - Token checked by the delivery loop before every handler call.
    /// * `detach` - Removes the subscriber from its source.
    /// * `worker` - The delivery thread, joined on unsubscribe.
    pub fn new<D>(
        topic: impl Into<String>,
        cancel: CancellationToken,
        detach: D,
        worker: Option<JoinHandle<()>>,
    ) -> Self
    where
        D: FnOnce() + Send + 'static,
    {
        Self {
            topic: topic.into(),
            cancel,
            detach: Some(Box::new(detach)),
            worker,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stops delivery. Blocks until an in-flight handler call has returned.
    pub fn unsubscribe(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel.cancel();

        if let Some(detach) = self.detach.take() {
            detach();
            debug!("unsubscribed from {}", self.topic);
        }

        if let Some(worker) = self.worker.take() {
            // Joining ourselves would deadlock; the loop exits on the cancel check.
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                warn!("delivery thread for {} panicked", self.topic);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}

type Payload = Arc<[u8]>;

struct Subscriber {
    id: u64,
    tx: mpsc::UnboundedSender<Payload>,
}

#[derive(Default)]
struct BusInner {
    topics: Mutex<HashMap<String, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn topics(&self) -> MutexGuard<'_, HashMap<String, Vec<Subscriber>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, topic: &str, id: u64) {
        let mut topics = self.topics();
        if let Some(subs) = topics.get_mut(topic) {
            subs.retain(|s| s.id != id);
            if subs.is_empty() {
                topics.remove(topic);
            }
        }
    }
}

/// In-process publish/subscribe bus.
///
/// Every subscription owns a FIFO and a dedicated delivery thread, so a slow
/// handler never reorders or drops payloads for itself and never blocks
/// publishers.
#[derive(Clone, Default)]
pub struct LocalBus {
    inner: Arc<BusInner>,
}

impl LocalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a raw payload to every current subscriber of `topic`.
    ///
    /// # Returns
    /// The number of subscribers the payload was queued for.
    pub fn publish(&self, topic: &str, payload: &[u8]) -> usize {
        let payload: Payload = Arc::from(payload);
        let mut topics = self.inner.topics();
        let Some(subs) = topics.get_mut(topic) else {
            return 0;
        };

        subs.retain(|s| !s.tx.is_closed());
        subs.iter()
            .filter(|s| s.tx.send(Arc::clone(&payload)).is_ok())
            .count()
    }

    /// Encodes `msg` and publishes it on `topic`.
    ///
    /// # Errors
    /// Returns [`OverlayError::Encode`] if the message cannot be serialized.
    pub fn publish_status(&self, topic: &str, msg: &StatusMessage) -> Result<usize> {
        let payload = msg.encode()?;
        Ok(self.publish(topic, &payload))
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.topics().get(topic).map_or(0, Vec::len)
    }
}

impl TelemetrySource for LocalBus {
    fn subscribe(&self, topic: &str, handler: MessageHandler) -> Result<Subscription> {
        validate_topic(topic)?;

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker = {
            let cancel = cancel.clone();
            let topic = topic.to_string();
            thread::Builder::new()
                .name(format!("telemetry:{topic}"))
                .spawn(move || deliver(rx, cancel, handler, &topic))?
        };

        self.inner
            .topics()
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber { id, tx });
        info!("subscribed to {topic}");

        let bus: Weak<BusInner> = Arc::downgrade(&self.inner);
        let owned_topic = topic.to_string();
        let detach = move || {
            if let Some(bus) = bus.upgrade() {
                bus.remove(&owned_topic, id);
            }
        };

        Ok(Subscription::new(topic, cancel, detach, Some(worker)))
    }
}

fn deliver(
    mut rx: mpsc::UnboundedReceiver<Payload>,
    cancel: CancellationToken,
    mut handler: MessageHandler,
    topic: &str,
) {
    debug!("delivery thread for {topic} started");
    while let Some(payload) = rx.blocking_recv() {
        if cancel.is_cancelled() {
            break;
        }
        handler(&payload);
    }
    debug!("delivery thread for {topic} stopped");
}

fn validate_topic(topic: &str) -> Result<()> {
    let valid = topic.len() > 1
        && topic.starts_with('/')
        && !topic.chars().any(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(OverlayError::InvalidTopic(topic.to_string()))
    }
}
