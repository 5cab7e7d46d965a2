//! In-process event bus with per-subscriber bounded queues.
//!
//! Every published [`ChangeEvent`] is appended to a fixed-capacity history
//! ring (replayed to new subscribers) and offered to each subscriber's own
//! queue with a non-blocking `try_send`. A full queue drops the event for that
//! subscriber only and bumps the drop counter; the producer never waits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};

use roomwatch_domain::event::ChangeEvent;
use roomwatch_domain::id::SubscriptionId;

/// Tuning knobs for the [`EventBus`].
#[derive(Debug, Clone)]
pub struct BusSettings {
    /// Number of recent events kept for replay.
    pub history_capacity: usize,
    /// Live events buffered per subscriber before dropping.
    pub subscriber_queue: usize,
    /// Silence after which a subscription yields [`Delivery::Keepalive`].
    pub idle_timeout: Duration,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            subscriber_queue: 64,
            idle_timeout: Duration::from_secs(30),
        }
    }
}

/// Unit yielded by a [`Subscription`].
#[derive(Debug, Clone)]
pub enum Delivery {
    Event(Arc<ChangeEvent>),
    /// Nothing happened for the idle timeout.
    Keepalive,
}

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusStats {
    pub subscribers: usize,
    pub retained: usize,
    /// Events dropped because a subscriber queue was full.
    pub dropped: u64,
}

/// Fixed-capacity ring of recent events, oldest evicted first.
struct History {
    events: VecDeque<Arc<ChangeEvent>>,
    capacity: usize,
}

impl History {
    fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, event: Arc<ChangeEvent>) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

struct Subscriber {
    id: SubscriptionId,
    sender: mpsc::Sender<Arc<ChangeEvent>>,
}

struct Inner {
    history: History,
    subscribers: Vec<Subscriber>,
}

struct Shared {
    settings: BusSettings,
    inner: Mutex<Inner>,
    dropped: AtomicU64,
}

impl Shared {
    fn remove(&self, id: SubscriptionId) {
        self.inner.lock().subscribers.retain(|sub| sub.id != id);
    }
}

/// Multi-producer, multi-subscriber broadcast of [`ChangeEvent`]s.
///
/// Cloning is cheap; all clones share the same history and subscribers.
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusSettings::default())
    }
}

impl EventBus {
    /// Create a bus with the given settings.
    #[must_use]
    pub fn new(settings: BusSettings) -> Self {
        let inner = Inner {
            history: History::new(settings.history_capacity),
            subscribers: Vec::new(),
        };
        Self {
            shared: Arc::new(Shared {
                settings,
                inner: Mutex::new(inner),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Publish an event to the history and every open subscription.
    ///
    /// Never blocks and never fails. Safe to call while holding other locks.
    pub fn publish(&self, event: ChangeEvent) {
        let event = Arc::new(event);
        let mut inner = self.shared.inner.lock();
        inner.history.push(Arc::clone(&event));
        inner
            .subscribers
            .retain(|sub| match sub.sender.try_send(Arc::clone(&event)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(subscription = %sub.id, kind = %event.kind, "subscriber queue full, event dropped");
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            });
    }

    /// Attach a subscriber.
    ///
    /// The subscription first replays the retained history (oldest first),
    /// then yields live events. History copy and registration happen under
    /// the same lock, so nothing is missed or repeated in between.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let settings = &self.shared.settings;
        let (sender, receiver) = mpsc::channel(settings.subscriber_queue.max(1));
        let id = SubscriptionId::new();

        let replay = {
            let mut inner = self.shared.inner.lock();
            let replay: VecDeque<_> = inner.history.events.iter().cloned().collect();
            inner.subscribers.push(Subscriber { id, sender });
            replay
        };
        tracing::debug!(subscription = %id, replay = replay.len(), "subscriber attached");

        Subscription {
            id,
            replay,
            receiver,
            idle_timeout: settings.idle_timeout,
            bus: Arc::downgrade(&self.shared),
        }
    }

    /// Detach a subscriber and release its queue.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Retained history, oldest first.
    #[must_use]
    pub fn recent(&self) -> Vec<ChangeEvent> {
        self.shared
            .inner
            .lock()
            .history
            .events
            .iter()
            .map(|event| (**event).clone())
            .collect()
    }

    #[must_use]
    pub fn stats(&self) -> BusStats {
        let inner = self.shared.inner.lock();
        BusStats {
            subscribers: inner.subscribers.len(),
            retained: inner.history.events.len(),
            dropped: self.shared.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Handle on one subscriber's delivery path.
///
/// Dropping it detaches the subscriber.
pub struct Subscription {
    id: SubscriptionId,
    replay: VecDeque<Arc<ChangeEvent>>,
    receiver: mpsc::Receiver<Arc<ChangeEvent>>,
    idle_timeout: Duration,
    bus: Weak<Shared>,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next replayed or live event, or a keepalive after the idle timeout.
    ///
    /// Returns `None` once the bus itself is gone.
    pub async fn next(&mut self) -> Option<Delivery> {
        if let Some(event) = self.replay.pop_front() {
            return Some(Delivery::Event(event));
        }
        match tokio::time::timeout(self.idle_timeout, self.receiver.recv()).await {
            Ok(Some(event)) => Some(Delivery::Event(event)),
            Ok(None) => None,
            Err(_elapsed) => Some(Delivery::Keepalive),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.bus.upgrade() {
            shared.remove(self.id);
            tracing::debug!(subscription = %self.id, "subscriber detached");
        }
    }
}
