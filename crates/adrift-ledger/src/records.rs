use serde::{Deserialize, Serialize};

use adrift_types::{BottleId, CommentId, ContentRef, Timestamp, UserId};

/// A user post with a time-bounded (or, once promoted, permanent) lifetime.
///
/// Bottles are never destroyed. "Expired" is a fact computed at read time
/// from [`Bottle::expires_at`] against the current clock, not a state
/// transition that removes data. `expires_at` is fixed at creation and
/// never recomputed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bottle {
    pub id: BottleId,
    /// The account that created this bottle. Immutable after creation.
    pub creator: UserId,
    /// Opaque reference to the externally stored message body.
    pub content: ContentRef,
    pub created_at: Timestamp,
    /// `created_at` plus the policy's expiration period, computed once.
    pub expires_at: Timestamp,
    pub like_count: u64,
    pub comment_count: u64,
    /// Set to `true` exactly once when both engagement thresholds are met
    /// (or by direct curation). Never reverts.
    pub forever: bool,
}

impl Bottle {
    /// Whether this bottle is expired at the given instant.
    ///
    /// A forever bottle is never expired, regardless of the clock. All
    /// other bottles are expired the instant `now == expires_at`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        !self.forever && now >= self.expires_at
    }
}

/// A comment on a bottle.
///
/// The parent bottle existed and was non-expired at the moment the comment
/// was accepted; the link is never mutated afterwards. Comments are created
/// once and never mutated or destroyed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub bottle: BottleId,
    pub author: UserId,
    /// Opaque reference to the externally stored comment body.
    pub content: ContentRef,
    pub created_at: Timestamp,
}
