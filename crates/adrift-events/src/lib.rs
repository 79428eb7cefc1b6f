//! Notification layer for Adrift.
//!
//! The ledger announces every accepted mutation as a [`LedgerEvent`] pushed
//! through an injected [`EventSink`]. Delivery is fire-and-forget:
//! at-least-once is acceptable and ledger correctness never depends on it.
//! External observers (indexers, feeds, metrics) subscribe through the
//! [`EventBus`] with an [`EventFilter`] and receive matching events over a
//! broadcast channel.

pub mod bus;
pub mod event;

pub use bus::{EventBus, EventFilter, EventSink, EventStream, NullSink};
pub use event::{EventId, EventKind, EventPayload, LedgerEvent};
