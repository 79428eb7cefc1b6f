use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::debug;

use adrift_types::{BottleId, Timestamp};

use crate::event::{EventKind, LedgerEvent};

/// The capability the ledger uses to announce accepted mutations.
///
/// Fire-and-forget: implementations must not block and must not fail in a
/// way the ledger has to handle. Correctness of the ledger never depends on
/// delivery.
pub trait EventSink: Send + Sync {
    /// Deliver a single event to whatever is listening.
    fn emit(&self, event: LedgerEvent);
}

/// An [`EventSink`] that discards every event.
///
/// The default sink for embedded and test use.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: LedgerEvent) {}
}

/// Filter for subscribing to a subset of ledger events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events for these bottles are delivered.
    pub bottles: Option<Vec<BottleId>>,
    /// If set, only events of these kinds are delivered.
    pub kinds: Option<Vec<EventKind>>,
    /// If set, only events stamped strictly after this instant are delivered.
    pub since: Option<Timestamp>,
}

impl EventFilter {
    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        if let Some(ref bottles) = self.bottles {
            if !bottles.contains(&event.bottle) {
                return false;
            }
        }
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.timestamp <= since {
                return false;
            }
        }
        true
    }
}

/// A broadcast channel receiver for ledger events.
pub type EventStream = broadcast::Receiver<LedgerEvent>;

/// Internal subscriber: a filter paired with a broadcast sender.
struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<LedgerEvent>,
}

/// Fan-out router that delivers ledger events to matching subscribers.
///
/// The bus is the production [`EventSink`]: the ledger pushes into it and
/// observers pull filtered streams out of it.
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
    channel_capacity: usize,
}

impl EventBus {
    /// Create a bus whose per-subscriber channels hold `channel_capacity`
    /// undelivered events before lagging.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            channel_capacity,
        }
    }

    /// Register a new subscriber with the given filter.
    /// Returns a broadcast receiver for the matching events.
    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        let (tx, rx) = broadcast::channel(self.channel_capacity);
        let sub = Subscriber { filter, sender: tx };
        self.subscribers
            .write()
            .expect("bus lock poisoned")
            .push(sub);
        rx
    }

    /// Route an event to all matching subscribers.
    /// Subscribers whose channels are closed are pruned.
    fn route(&self, event: &LedgerEvent) {
        let mut subs = self.subscribers.write().expect("bus lock poisoned");
        subs.retain(|sub| {
            if sub.filter.matches(event) {
                // If send fails (no receivers), the subscriber is stale.
                sub.sender.send(event.clone()).is_ok()
            } else {
                // Keep non-matching subscribers; they may match future events.
                // Only prune if the channel itself is closed.
                sub.sender.receiver_count() > 0
            }
        });
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("bus lock poisoned")
            .len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: LedgerEvent) {
        debug!(id = %event.id, kind = %event.kind, bottle = %event.bottle, "event emitted");
        self.route(&event);
    }
}
