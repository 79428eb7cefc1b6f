use adrift_types::{BottleId, CommentId, ContentRef, UserId};

use crate::error::LedgerError;
use crate::records::{Bottle, Comment};

/// Write boundary for bottle ledger mutations.
///
/// Every method takes the acting `caller` identity, which is checked
/// against the ledger's access policy before anything else. All
/// preconditions are validated before any mutation: a returned error means
/// nothing was applied.
pub trait LedgerWriter: Send + Sync {
    /// Create a bottle owned by `creator` pointing at `content`.
    ///
    /// The new bottle receives the next dense id, zeroed counters, and an
    /// expiration deadline of now plus the policy's expiration period.
    /// Rejects `EmptyContent`, `InvalidIdentity`, and `Unauthorized`.
    fn create_bottle(
        &self,
        caller: &UserId,
        creator: &UserId,
        content: ContentRef,
    ) -> Result<BottleId, LedgerError>;

    /// Record a like by `liker` and return the new like count.
    ///
    /// The bottle must exist and be non-expired (unless forever). Under
    /// tracked accounting a duplicate like rejects `AlreadyLiked`.
    /// Crossing both thresholds promotes the bottle to forever.
    fn like_bottle(
        &self,
        caller: &UserId,
        bottle: BottleId,
        liker: &UserId,
    ) -> Result<u64, LedgerError>;

    /// Withdraw a like by `unliker` and return the new like count.
    ///
    /// Under tracked accounting an unlike without a prior like rejects
    /// `NotLiked`; under trusted accounting an unlike at zero rejects
    /// `CounterUnderflow`.
    fn unlike_bottle(
        &self,
        caller: &UserId,
        bottle: BottleId,
        unliker: &UserId,
    ) -> Result<u64, LedgerError>;

    /// Add a comment by `author` and return its id.
    ///
    /// The bottle must exist and be non-expired (unless forever). The
    /// comment id is appended to the bottle's insertion-ordered list and
    /// the promotion rule is evaluated.
    fn add_comment(
        &self,
        caller: &UserId,
        bottle: BottleId,
        author: &UserId,
        content: ContentRef,
    ) -> Result<CommentId, LedgerError>;

    /// Promote a bottle to forever directly, bypassing the thresholds
    /// (manual curation). Rejects `AlreadyForever` if already permanent.
    fn promote(&self, caller: &UserId, bottle: BottleId) -> Result<(), LedgerError>;

    /// Promote based on externally supplied counts.
    ///
    /// For deployments where engagement counts live off-ledger: the caller
    /// is the source of truth and the ledger's own counters are never
    /// inspected. Rejects `ThresholdsNotMet` if either supplied count is
    /// below its threshold, and `AlreadyForever` if already permanent.
    fn promote_with_counts(
        &self,
        caller: &UserId,
        bottle: BottleId,
        like_count: u64,
        comment_count: u64,
    ) -> Result<(), LedgerError>;

    /// Overwrite a bottle's content reference in place.
    ///
    /// An administrative correction, not engagement: there is deliberately
    /// no expiration check, so metadata can be fixed even on an
    /// expired-but-not-forever bottle.
    fn update_content(
        &self,
        caller: &UserId,
        bottle: BottleId,
        content: ContentRef,
    ) -> Result<(), LedgerError>;
}

/// Read boundary for bottle ledger queries. All reads are side-effect-free
/// and observe a consistent snapshot of a record.
pub trait LedgerReader: Send + Sync {
    /// Fetch a bottle. Rejects `BottleNotFound` for unknown ids.
    fn get_bottle(&self, bottle: BottleId) -> Result<Bottle, LedgerError>;

    /// Fetch a comment. Rejects `CommentNotFound` for unknown ids.
    fn get_comment(&self, comment: CommentId) -> Result<Comment, LedgerError>;

    /// The bottle's comment ids in the exact order they were accepted.
    /// Empty (never an error) when there are none, but the bottle itself
    /// must exist.
    fn bottle_comments(&self, bottle: BottleId) -> Result<Vec<CommentId>, LedgerError>;

    /// Ids of the bottles `user` created, in creation order. Empty for an
    /// unknown user.
    fn user_bottles(&self, user: &UserId) -> Result<Vec<BottleId>, LedgerError>;

    /// Whether `user` currently likes the bottle. Meaningful under tracked
    /// accounting only; always `false` under trusted accounting.
    fn has_liked(&self, bottle: BottleId, user: &UserId) -> Result<bool, LedgerError>;

    /// Whether the bottle is expired at the current clock reading.
    ///
    /// Unconditionally `false` once the bottle is forever; otherwise
    /// `true` exactly when `now >= expires_at`.
    fn is_expired(&self, bottle: BottleId) -> Result<bool, LedgerError>;

    /// Total number of bottles ever created.
    fn bottle_count(&self) -> u64;

    /// Total number of comments ever accepted.
    fn comment_count(&self) -> u64;
}
