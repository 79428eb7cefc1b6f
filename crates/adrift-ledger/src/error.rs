use adrift_types::{BottleId, CommentId, Timestamp, UserId};

/// Errors produced by ledger operations.
///
/// Every precondition is checked before any mutation, so a returned error
/// always means the operation was rejected whole: no partial state change
/// has occurred and the ledger remains usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("content reference must not be empty")]
    EmptyContent,

    #[error("the zero identity is not a valid participant")]
    InvalidIdentity,

    #[error("bottle {0} not found")]
    BottleNotFound(BottleId),

    #[error("comment {0} not found")]
    CommentNotFound(CommentId),

    #[error("bottle {id} expired at {expires_at}")]
    Expired { id: BottleId, expires_at: Timestamp },

    #[error("caller {0} is not the authorized writer")]
    Unauthorized(UserId),

    #[error("user {user} already liked bottle {id}")]
    AlreadyLiked { id: BottleId, user: UserId },

    #[error("user {user} has not liked bottle {id}")]
    NotLiked { id: BottleId, user: UserId },

    #[error("bottle {0} is already forever")]
    AlreadyForever(BottleId),

    #[error("supplied counts (likes={likes}, comments={comments}) do not meet the promotion thresholds")]
    ThresholdsNotMet { likes: u64, comments: u64 },

    #[error("like count for bottle {0} is already zero")]
    CounterUnderflow(BottleId),
}
