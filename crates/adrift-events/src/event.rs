use serde::{Deserialize, Serialize};

use adrift_types::{BottleId, CommentId, ContentRef, Timestamp, UserId};

/// Unique identifier for a ledger event.
///
/// A BLAKE3 hash of the event content, making events content-addressable
/// and deduplicatable on the consumer side.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId {
    /// Content hash of the event (BLAKE3).
    pub hash: [u8; 32],
}

impl EventId {
    /// Create an `EventId` from a raw hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self { hash }
    }

    /// Short hex representation (first 8 hex chars).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.hash[..4])
    }

    /// Full hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "evt:{}", self.short_hex())
    }
}

/// Classification of ledger events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A new bottle has been created.
    BottleCreated,
    /// A bottle has been liked.
    BottleLiked,
    /// A like has been withdrawn.
    BottleUnliked,
    /// A comment has been added to a bottle.
    CommentAdded,
    /// A bottle has crossed both engagement thresholds (or was promoted
    /// directly) and is now permanent.
    BecameForever,
    /// A bottle's content reference has been overwritten.
    ContentUpdated,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BottleCreated => "BottleCreated",
            Self::BottleLiked => "BottleLiked",
            Self::BottleUnliked => "BottleUnliked",
            Self::CommentAdded => "CommentAdded",
            Self::BecameForever => "BecameForever",
            Self::ContentUpdated => "ContentUpdated",
        };
        write!(f, "{s}")
    }
}

/// Payload data carried by a ledger event.
///
/// Different event kinds carry different payload shapes. Payloads exist for
/// external observers only; nothing in the ledger reads them back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    /// Empty payload (event kind is self-describing).
    Empty,
    /// Creation payload: who made the bottle, what it points at, and when
    /// it will expire.
    Created {
        creator: UserId,
        content: ContentRef,
        expires_at: Timestamp,
    },
    /// Like/unlike payload with the count after the operation.
    Engagement { user: UserId, like_count: u64 },
    /// Comment payload with the count after the operation.
    Comment {
        comment: CommentId,
        author: UserId,
        comment_count: u64,
    },
    /// Promotion payload with the counts that satisfied the thresholds.
    Forever { like_count: u64, comment_count: u64 },
    /// Content update payload carrying the new reference.
    ContentUpdate { content: ContentRef },
}

/// A single notification emitted by the ledger.
///
/// Every event carries a content-addressed ID, the timestamp the ledger
/// observed for the operation, the bottle it pertains to, a classification
/// kind, a payload, and a BLAKE3 integrity hash computed over
/// (timestamp, bottle, kind, payload).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique event identifier (content-addressed).
    pub id: EventId,
    /// Ledger timestamp of the operation that produced this event.
    pub timestamp: Timestamp,
    /// The bottle this event pertains to.
    pub bottle: BottleId,
    /// Classification of this event.
    pub kind: EventKind,
    /// Event-specific payload data.
    pub payload: EventPayload,
    /// BLAKE3 integrity hash over (timestamp, bottle, kind, payload).
    pub integrity_hash: [u8; 32],
}

impl LedgerEvent {
    /// Build a new `LedgerEvent`, computing its integrity hash and event ID.
    pub fn new(
        timestamp: Timestamp,
        bottle: BottleId,
        kind: EventKind,
        payload: EventPayload,
    ) -> Self {
        let integrity_hash = Self::compute_integrity(&timestamp, &bottle, &kind, &payload);
        let id = EventId::from_hash(integrity_hash);
        Self {
            id,
            timestamp,
            bottle,
            kind,
            payload,
            integrity_hash,
        }
    }

    /// Verify the event's integrity hash matches its content.
    pub fn verify_integrity(&self) -> bool {
        let expected =
            Self::compute_integrity(&self.timestamp, &self.bottle, &self.kind, &self.payload);
        self.integrity_hash == expected
    }

    /// Compute the BLAKE3 integrity hash over the event's core fields.
    fn compute_integrity(
        timestamp: &Timestamp,
        bottle: &BottleId,
        kind: &EventKind,
        payload: &EventPayload,
    ) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"adrift-event-v1:");

        hasher.update(&timestamp.as_millis().to_le_bytes());
        hasher.update(&bottle.get().to_le_bytes());

        // Hash kind and payload via bincode
        if let Ok(kind_bytes) = bincode::serialize(kind) {
            hasher.update(&kind_bytes);
        }
        if let Ok(payload_bytes) = bincode::serialize(payload) {
            hasher.update(&payload_bytes);
        }

        *hasher.finalize().as_bytes()
    }
}
