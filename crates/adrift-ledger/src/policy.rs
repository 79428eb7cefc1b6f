use std::time::Duration;

use serde::{Deserialize, Serialize};

use adrift_types::UserId;

/// Reference expiration period: 30 days.
pub const DEFAULT_EXPIRATION_PERIOD: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Reference like threshold for promotion.
pub const DEFAULT_LIKES_THRESHOLD: u64 = 100;

/// Reference comment threshold for promotion.
pub const DEFAULT_COMMENTS_THRESHOLD: u64 = 4;

/// Who may invoke mutating operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessPolicy {
    /// Any caller is permitted; participants self-identify through the
    /// per-operation identity parameters. Suited to embedded single-user
    /// deployments where gating lives outside the ledger.
    Open,
    /// All mutations are restricted to one fixed writer identity
    /// established at ledger construction. The reference policy.
    SingleWriter(UserId),
}

impl AccessPolicy {
    /// Returns `true` if `caller` may mutate under this policy.
    pub fn permits(&self, caller: &UserId) -> bool {
        match self {
            Self::Open => true,
            Self::SingleWriter(writer) => caller == writer,
        }
    }
}

/// How like/unlike operations are accounted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LikeAccounting {
    /// Per-user uniqueness is tracked in a `(bottle, user)` set. Duplicate
    /// likes reject with `AlreadyLiked`; unlikes without a prior like
    /// reject with `NotLiked`.
    Tracked,
    /// The caller's accounting is trusted: every like increments and every
    /// unlike decrements, except that an unlike at zero rejects with
    /// `CounterUnderflow`.
    Trusted,
}

/// Configuration for a bottle ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPolicy {
    /// How long a bottle lives before expiring, measured from creation.
    pub expiration_period: Duration,
    /// Minimum like count for threshold promotion (inclusive).
    pub likes_threshold: u64,
    /// Minimum comment count for threshold promotion (inclusive).
    pub comments_threshold: u64,
    /// Like/unlike accounting mode.
    pub like_accounting: LikeAccounting,
    /// Mutation gating.
    pub access: AccessPolicy,
}

impl Default for LedgerPolicy {
    /// The reference policy with open access: 30-day expiration, 100-like /
    /// 4-comment thresholds, tracked likes. Open access makes the ledger
    /// usable out of the box for local and embedded deployments; gating
    /// activates when a writer is configured via
    /// [`LedgerPolicy::single_writer`].
    fn default() -> Self {
        Self {
            expiration_period: DEFAULT_EXPIRATION_PERIOD,
            likes_threshold: DEFAULT_LIKES_THRESHOLD,
            comments_threshold: DEFAULT_COMMENTS_THRESHOLD,
            like_accounting: LikeAccounting::Tracked,
            access: AccessPolicy::Open,
        }
    }
}

impl LedgerPolicy {
    /// The reference policy gated to a single authorized writer.
    pub fn single_writer(writer: UserId) -> Self {
        Self {
            access: AccessPolicy::SingleWriter(writer),
            ..Default::default()
        }
    }

    /// Inclusive threshold check on both dimensions simultaneously.
    /// Partial satisfaction never promotes.
    pub fn meets_thresholds(&self, likes: u64, comments: u64) -> bool {
        likes >= self.likes_threshold && comments >= self.comments_threshold
    }
}
