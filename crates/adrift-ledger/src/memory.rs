use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use adrift_events::{EventKind, EventPayload, EventSink, LedgerEvent, NullSink};
use adrift_types::{BottleId, Clock, CommentId, ContentRef, SystemClock, Timestamp, UserId};

use crate::error::LedgerError;
use crate::policy::{LedgerPolicy, LikeAccounting};
use crate::records::{Bottle, Comment};
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory bottle ledger for tests, local demos, and embedding.
///
/// All records live behind one `RwLock`, which gives readers a consistent
/// snapshot of any record while a single serialized writer applies
/// mutations. The lock is not what enforces the single-writer discipline
/// (that remains the execution environment's job); it only makes the
/// handle shareable.
pub struct InMemoryLedger {
    pub(crate) policy: LedgerPolicy,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    pub(crate) inner: RwLock<LedgerState>,
}

#[derive(Default)]
pub(crate) struct LedgerState {
    pub(crate) bottles: HashMap<BottleId, Bottle>,
    pub(crate) comments: HashMap<CommentId, Comment>,
    /// Per-bottle comment ids in acceptance order.
    pub(crate) bottle_comments: HashMap<BottleId, Vec<CommentId>>,
    /// Who likes what, under tracked accounting.
    pub(crate) likes: HashSet<(BottleId, UserId)>,
    /// Reverse index: creator to owned bottle ids, in creation order.
    pub(crate) user_bottles: HashMap<UserId, Vec<BottleId>>,
}

impl LedgerState {
    /// Next dense bottle id. Records are never deleted, so the id sequence
    /// is always `len + 1` and a rejected create consumes nothing.
    fn next_bottle_id(&self) -> BottleId {
        BottleId::new(self.bottles.len() as u64 + 1)
    }

    /// Next dense comment id, on its own counter.
    fn next_comment_id(&self) -> CommentId {
        CommentId::new(self.comments.len() as u64 + 1)
    }

    /// Existence plus expiration precondition shared by every engagement
    /// operation.
    fn engageable(&self, id: BottleId, now: Timestamp) -> Result<(), LedgerError> {
        let bottle = self
            .bottles
            .get(&id)
            .ok_or(LedgerError::BottleNotFound(id))?;
        if bottle.is_expired_at(now) {
            return Err(LedgerError::Expired {
                id,
                expires_at: bottle.expires_at,
            });
        }
        Ok(())
    }
}

impl InMemoryLedger {
    /// Create a ledger with explicit policy, clock, and notification sink.
    pub fn new(policy: LedgerPolicy, clock: Arc<dyn Clock>, events: Arc<dyn EventSink>) -> Self {
        Self {
            policy,
            clock,
            events,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// Create a ledger with the given policy, the system clock, and no
    /// notification sink.
    pub fn with_policy(policy: LedgerPolicy) -> Self {
        Self::new(policy, Arc::new(SystemClock::new()), Arc::new(NullSink))
    }

    /// The policy this ledger was created with.
    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    fn authorize(&self, caller: &UserId) -> Result<(), LedgerError> {
        if self.policy.access.permits(caller) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized(*caller))
        }
    }

    fn emit(&self, now: Timestamp, bottle: BottleId, kind: EventKind, payload: EventPayload) {
        self.events
            .emit(LedgerEvent::new(now, bottle, kind, payload));
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::with_policy(LedgerPolicy::default())
    }
}

/// One-way threshold promotion, evaluated after every accepted like or
/// comment. Re-evaluating an already-forever bottle is a no-op.
fn promote_if_eligible(policy: &LedgerPolicy, bottle: &mut Bottle) -> Option<(u64, u64)> {
    if !bottle.forever && policy.meets_thresholds(bottle.like_count, bottle.comment_count) {
        bottle.forever = true;
        Some((bottle.like_count, bottle.comment_count))
    } else {
        None
    }
}

impl LedgerWriter for InMemoryLedger {
    fn create_bottle(
        &self,
        caller: &UserId,
        creator: &UserId,
        content: ContentRef,
    ) -> Result<BottleId, LedgerError> {
        self.authorize(caller)?;
        if creator.is_zero() {
            return Err(LedgerError::InvalidIdentity);
        }
        if content.is_empty() {
            return Err(LedgerError::EmptyContent);
        }

        let now = self.clock.now();
        let mut state = self.inner.write().expect("ledger lock poisoned");

        let id = state.next_bottle_id();
        let expires_at = now.saturating_add(self.policy.expiration_period);
        let bottle = Bottle {
            id,
            creator: *creator,
            content: content.clone(),
            created_at: now,
            expires_at,
            like_count: 0,
            comment_count: 0,
            forever: false,
        };

        state.bottles.insert(id, bottle);
        state.bottle_comments.insert(id, Vec::new());
        state.user_bottles.entry(*creator).or_default().push(id);
        drop(state);

        debug!(%id, creator = %creator, "bottle created");
        self.emit(
            now,
            id,
            EventKind::BottleCreated,
            EventPayload::Created {
                creator: *creator,
                content,
                expires_at,
            },
        );
        Ok(id)
    }

    fn like_bottle(
        &self,
        caller: &UserId,
        bottle: BottleId,
        liker: &UserId,
    ) -> Result<u64, LedgerError> {
        self.authorize(caller)?;
        if liker.is_zero() {
            return Err(LedgerError::InvalidIdentity);
        }

        let now = self.clock.now();
        let mut state = self.inner.write().expect("ledger lock poisoned");
        state.engageable(bottle, now)?;

        if self.policy.like_accounting == LikeAccounting::Tracked {
            if state.likes.contains(&(bottle, *liker)) {
                return Err(LedgerError::AlreadyLiked {
                    id: bottle,
                    user: *liker,
                });
            }
            state.likes.insert((bottle, *liker));
        }

        let record = state
            .bottles
            .get_mut(&bottle)
            .ok_or(LedgerError::BottleNotFound(bottle))?;
        record.like_count += 1;
        let like_count = record.like_count;
        let promoted = promote_if_eligible(&self.policy, record);
        drop(state);

        debug!(id = %bottle, user = %liker, like_count, "bottle liked");
        self.emit(
            now,
            bottle,
            EventKind::BottleLiked,
            EventPayload::Engagement {
                user: *liker,
                like_count,
            },
        );
        if let Some((likes, comments)) = promoted {
            info!(id = %bottle, likes, comments, "bottle became forever");
            self.emit(
                now,
                bottle,
                EventKind::BecameForever,
                EventPayload::Forever {
                    like_count: likes,
                    comment_count: comments,
                },
            );
        }
        Ok(like_count)
    }

    fn unlike_bottle(
        &self,
        caller: &UserId,
        bottle: BottleId,
        unliker: &UserId,
    ) -> Result<u64, LedgerError> {
        self.authorize(caller)?;
        if unliker.is_zero() {
            return Err(LedgerError::InvalidIdentity);
        }

        let now = self.clock.now();
        let mut state = self.inner.write().expect("ledger lock poisoned");
        state.engageable(bottle, now)?;

        match self.policy.like_accounting {
            LikeAccounting::Tracked => {
                if !state.likes.remove(&(bottle, *unliker)) {
                    return Err(LedgerError::NotLiked {
                        id: bottle,
                        user: *unliker,
                    });
                }
            }
            LikeAccounting::Trusted => {
                let current = state
                    .bottles
                    .get(&bottle)
                    .map(|b| b.like_count)
                    .unwrap_or(0);
                if current == 0 {
                    return Err(LedgerError::CounterUnderflow(bottle));
                }
            }
        }

        let record = state
            .bottles
            .get_mut(&bottle)
            .ok_or(LedgerError::BottleNotFound(bottle))?;
        record.like_count -= 1;
        let like_count = record.like_count;
        drop(state);

        debug!(id = %bottle, user = %unliker, like_count, "bottle unliked");
        self.emit(
            now,
            bottle,
            EventKind::BottleUnliked,
            EventPayload::Engagement {
                user: *unliker,
                like_count,
            },
        );
        Ok(like_count)
    }

    fn add_comment(
        &self,
        caller: &UserId,
        bottle: BottleId,
        author: &UserId,
        content: ContentRef,
    ) -> Result<CommentId, LedgerError> {
        self.authorize(caller)?;
        if author.is_zero() {
            return Err(LedgerError::InvalidIdentity);
        }
        if content.is_empty() {
            return Err(LedgerError::EmptyContent);
        }

        let now = self.clock.now();
        let mut state = self.inner.write().expect("ledger lock poisoned");
        state.engageable(bottle, now)?;

        let id = state.next_comment_id();
        let comment = Comment {
            id,
            bottle,
            author: *author,
            content,
            created_at: now,
        };
        state.comments.insert(id, comment);
        state.bottle_comments.entry(bottle).or_default().push(id);

        let record = state
            .bottles
            .get_mut(&bottle)
            .ok_or(LedgerError::BottleNotFound(bottle))?;
        record.comment_count += 1;
        let comment_count = record.comment_count;
        let promoted = promote_if_eligible(&self.policy, record);
        drop(state);

        debug!(id = %bottle, comment = %id, author = %author, "comment added");
        self.emit(
            now,
            bottle,
            EventKind::CommentAdded,
            EventPayload::Comment {
                comment: id,
                author: *author,
                comment_count,
            },
        );
        if let Some((likes, comments)) = promoted {
            info!(id = %bottle, likes, comments, "bottle became forever");
            self.emit(
                now,
                bottle,
                EventKind::BecameForever,
                EventPayload::Forever {
                    like_count: likes,
                    comment_count: comments,
                },
            );
        }
        Ok(id)
    }

    fn promote(&self, caller: &UserId, bottle: BottleId) -> Result<(), LedgerError> {
        self.authorize(caller)?;

        let now = self.clock.now();
        let mut state = self.inner.write().expect("ledger lock poisoned");
        let record = state
            .bottles
            .get_mut(&bottle)
            .ok_or(LedgerError::BottleNotFound(bottle))?;
        if record.forever {
            return Err(LedgerError::AlreadyForever(bottle));
        }
        record.forever = true;
        let like_count = record.like_count;
        let comment_count = record.comment_count;
        drop(state);

        info!(id = %bottle, "bottle promoted by curation");
        self.emit(
            now,
            bottle,
            EventKind::BecameForever,
            EventPayload::Forever {
                like_count,
                comment_count,
            },
        );
        Ok(())
    }

    fn promote_with_counts(
        &self,
        caller: &UserId,
        bottle: BottleId,
        like_count: u64,
        comment_count: u64,
    ) -> Result<(), LedgerError> {
        self.authorize(caller)?;

        let now = self.clock.now();
        let mut state = self.inner.write().expect("ledger lock poisoned");
        let record = state
            .bottles
            .get_mut(&bottle)
            .ok_or(LedgerError::BottleNotFound(bottle))?;
        if record.forever {
            return Err(LedgerError::AlreadyForever(bottle));
        }
        // The caller is the source of truth here; the ledger's own counters
        // are never consulted.
        if !self.policy.meets_thresholds(like_count, comment_count) {
            return Err(LedgerError::ThresholdsNotMet {
                likes: like_count,
                comments: comment_count,
            });
        }
        record.forever = true;
        drop(state);

        info!(id = %bottle, like_count, comment_count, "bottle promoted with supplied counts");
        self.emit(
            now,
            bottle,
            EventKind::BecameForever,
            EventPayload::Forever {
                like_count,
                comment_count,
            },
        );
        Ok(())
    }

    fn update_content(
        &self,
        caller: &UserId,
        bottle: BottleId,
        content: ContentRef,
    ) -> Result<(), LedgerError> {
        self.authorize(caller)?;
        if content.is_empty() {
            return Err(LedgerError::EmptyContent);
        }

        // No expiration check: correcting the content pointer is an
        // administrative action, not user engagement.
        let now = self.clock.now();
        let mut state = self.inner.write().expect("ledger lock poisoned");
        let record = state
            .bottles
            .get_mut(&bottle)
            .ok_or(LedgerError::BottleNotFound(bottle))?;
        record.content = content.clone();
        drop(state);

        debug!(id = %bottle, "content reference updated");
        self.emit(
            now,
            bottle,
            EventKind::ContentUpdated,
            EventPayload::ContentUpdate { content },
        );
        Ok(())
    }
}

impl LedgerReader for InMemoryLedger {
    fn get_bottle(&self, bottle: BottleId) -> Result<Bottle, LedgerError> {
        let state = self.inner.read().expect("ledger lock poisoned");
        state
            .bottles
            .get(&bottle)
            .cloned()
            .ok_or(LedgerError::BottleNotFound(bottle))
    }

    fn get_comment(&self, comment: CommentId) -> Result<Comment, LedgerError> {
        let state = self.inner.read().expect("ledger lock poisoned");
        state
            .comments
            .get(&comment)
            .cloned()
            .ok_or(LedgerError::CommentNotFound(comment))
    }

    fn bottle_comments(&self, bottle: BottleId) -> Result<Vec<CommentId>, LedgerError> {
        let state = self.inner.read().expect("ledger lock poisoned");
        if !state.bottles.contains_key(&bottle) {
            return Err(LedgerError::BottleNotFound(bottle));
        }
        Ok(state
            .bottle_comments
            .get(&bottle)
            .cloned()
            .unwrap_or_default())
    }

    fn user_bottles(&self, user: &UserId) -> Result<Vec<BottleId>, LedgerError> {
        let state = self.inner.read().expect("ledger lock poisoned");
        Ok(state.user_bottles.get(user).cloned().unwrap_or_default())
    }

    fn has_liked(&self, bottle: BottleId, user: &UserId) -> Result<bool, LedgerError> {
        let state = self.inner.read().expect("ledger lock poisoned");
        if !state.bottles.contains_key(&bottle) {
            return Err(LedgerError::BottleNotFound(bottle));
        }
        Ok(state.likes.contains(&(bottle, *user)))
    }

    fn is_expired(&self, bottle: BottleId) -> Result<bool, LedgerError> {
        let now = self.clock.now();
        let state = self.inner.read().expect("ledger lock poisoned");
        state
            .bottles
            .get(&bottle)
            .map(|b| b.is_expired_at(now))
            .ok_or(LedgerError::BottleNotFound(bottle))
    }

    fn bottle_count(&self) -> u64 {
        let state = self.inner.read().expect("ledger lock poisoned");
        state.bottles.len() as u64
    }

    fn comment_count(&self) -> u64 {
        let state = self.inner.read().expect("ledger lock poisoned");
        state.comments.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use adrift_events::{EventBus, EventFilter};
    use adrift_types::ManualClock;

    use crate::policy::AccessPolicy;

    use super::*;

    const START_MS: u64 = 1_700_000_000_000;
    const PERIOD: Duration = Duration::from_secs(30 * 24 * 60 * 60);

    fn writer() -> UserId {
        UserId::derive(b"writer")
    }

    fn ledger_with(policy: LedgerPolicy) -> (Arc<ManualClock>, InMemoryLedger) {
        let clock = Arc::new(ManualClock::starting_at(Timestamp::from_millis(START_MS)));
        let ledger = InMemoryLedger::new(policy, clock.clone(), Arc::new(NullSink));
        (clock, ledger)
    }

    fn open_ledger() -> (Arc<ManualClock>, InMemoryLedger) {
        ledger_with(LedgerPolicy::default())
    }

    /// A policy small enough to promote without a hundred likers.
    fn small_thresholds() -> LedgerPolicy {
        LedgerPolicy {
            likes_threshold: 2,
            comments_threshold: 1,
            ..Default::default()
        }
    }

    fn create(ledger: &InMemoryLedger, creator: &UserId, content: &str) -> BottleId {
        ledger
            .create_bottle(creator, creator, ContentRef::new(content))
            .unwrap()
    }

    #[test]
    fn create_assigns_dense_ids_from_one() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");

        let first = create(&ledger, &alice, "Qm1");
        let second = create(&ledger, &alice, "Qm2");
        assert_eq!(first, BottleId::new(1));
        assert_eq!(second, BottleId::new(2));

        let bottle = ledger.get_bottle(first).unwrap();
        assert_eq!(bottle.creator, alice);
        assert_eq!(bottle.content, ContentRef::new("Qm1"));
        assert_eq!(bottle.like_count, 0);
        assert_eq!(bottle.comment_count, 0);
        assert!(!bottle.forever);
        assert_eq!(bottle.expires_at, bottle.created_at.saturating_add(PERIOD));
    }

    #[test]
    fn rejected_create_consumes_no_id() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");

        let error = ledger
            .create_bottle(&alice, &alice, ContentRef::new(""))
            .unwrap_err();
        assert_eq!(error, LedgerError::EmptyContent);
        assert_eq!(ledger.bottle_count(), 0);

        // The next accepted create still gets id 1.
        assert_eq!(create(&ledger, &alice, "Qm1"), BottleId::new(1));
    }

    #[test]
    fn create_rejects_zero_creator() {
        let (_clock, ledger) = open_ledger();
        let error = ledger
            .create_bottle(&UserId::derive(b"caller"), &UserId::zero(), ContentRef::new("Qm1"))
            .unwrap_err();
        assert_eq!(error, LedgerError::InvalidIdentity);
    }

    #[test]
    fn single_writer_gates_mutations() {
        let (_clock, ledger) = ledger_with(LedgerPolicy::single_writer(writer()));
        let alice = UserId::derive(b"alice");
        let intruder = UserId::derive(b"intruder");

        let error = ledger
            .create_bottle(&intruder, &alice, ContentRef::new("Qm1"))
            .unwrap_err();
        assert_eq!(error, LedgerError::Unauthorized(intruder));

        let id = ledger
            .create_bottle(&writer(), &alice, ContentRef::new("Qm1"))
            .unwrap();
        let error = ledger.like_bottle(&intruder, id, &alice).unwrap_err();
        assert_eq!(error, LedgerError::Unauthorized(intruder));
        assert_eq!(ledger.like_bottle(&writer(), id, &alice).unwrap(), 1);
    }

    #[test]
    fn bottle_expires_at_the_deadline_instant() {
        let (clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");

        assert!(!ledger.is_expired(id).unwrap());

        clock.advance(PERIOD - Duration::from_millis(1));
        assert!(!ledger.is_expired(id).unwrap());

        clock.advance(Duration::from_millis(1));
        // now == expires_at: expired.
        assert!(ledger.is_expired(id).unwrap());
    }

    #[test]
    fn expires_one_second_past_the_period() {
        let (clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");

        assert!(!ledger.is_expired(id).unwrap());
        clock.advance(PERIOD + Duration::from_secs(1));
        assert!(ledger.is_expired(id).unwrap());
    }

    #[test]
    fn duplicate_like_is_rejected() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let bob = UserId::derive(b"bob");
        let id = create(&ledger, &alice, "Qm1");

        assert_eq!(ledger.like_bottle(&bob, id, &bob).unwrap(), 1);
        assert!(ledger.has_liked(id, &bob).unwrap());

        let error = ledger.like_bottle(&bob, id, &bob).unwrap_err();
        assert_eq!(error, LedgerError::AlreadyLiked { id, user: bob });
        assert_eq!(ledger.get_bottle(id).unwrap().like_count, 1);
    }

    #[test]
    fn unlike_requires_a_prior_like() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let bob = UserId::derive(b"bob");
        let id = create(&ledger, &alice, "Qm1");

        let error = ledger.unlike_bottle(&bob, id, &bob).unwrap_err();
        assert_eq!(error, LedgerError::NotLiked { id, user: bob });

        ledger.like_bottle(&bob, id, &bob).unwrap();
        assert_eq!(ledger.unlike_bottle(&bob, id, &bob).unwrap(), 0);
        assert!(!ledger.has_liked(id, &bob).unwrap());
    }

    #[test]
    fn engagement_is_rejected_after_expiry() {
        let (clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let bob = UserId::derive(b"bob");
        let id = create(&ledger, &alice, "Qm1");
        ledger.like_bottle(&bob, id, &bob).unwrap();

        clock.advance(PERIOD);
        let expires_at = ledger.get_bottle(id).unwrap().expires_at;

        let expired = LedgerError::Expired { id, expires_at };
        assert_eq!(ledger.like_bottle(&alice, id, &alice).unwrap_err(), expired);
        assert_eq!(ledger.unlike_bottle(&bob, id, &bob).unwrap_err(), expired);
        assert_eq!(
            ledger
                .add_comment(&bob, id, &bob, ContentRef::new("QmC"))
                .unwrap_err(),
            expired
        );
    }

    #[test]
    fn comments_are_ordered_and_counted() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let bob = UserId::derive(b"bob");
        let id = create(&ledger, &alice, "Qm1");

        let c1 = ledger
            .add_comment(&bob, id, &bob, ContentRef::new("QmC1"))
            .unwrap();
        let c2 = ledger
            .add_comment(&alice, id, &alice, ContentRef::new("QmC2"))
            .unwrap();
        let c3 = ledger
            .add_comment(&bob, id, &bob, ContentRef::new("QmC3"))
            .unwrap();

        assert_eq!(c1, CommentId::new(1));
        assert_eq!(c2, CommentId::new(2));
        assert_eq!(c3, CommentId::new(3));

        let listed = ledger.bottle_comments(id).unwrap();
        assert_eq!(listed, vec![c1, c2, c3]);
        assert_eq!(listed.len() as u64, ledger.get_bottle(id).unwrap().comment_count);

        let comment = ledger.get_comment(c2).unwrap();
        assert_eq!(comment.bottle, id);
        assert_eq!(comment.author, alice);
        assert_eq!(comment.content, ContentRef::new("QmC2"));
    }

    #[test]
    fn comment_ids_run_on_their_own_counter() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let first = create(&ledger, &alice, "Qm1");
        let second = create(&ledger, &alice, "Qm2");

        let c = ledger
            .add_comment(&alice, second, &alice, ContentRef::new("QmC"))
            .unwrap();
        assert_eq!(c, CommentId::new(1));
        assert!(ledger.bottle_comments(first).unwrap().is_empty());
    }

    #[test]
    fn comment_validation_mirrors_creation() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");

        assert_eq!(
            ledger
                .add_comment(&alice, id, &alice, ContentRef::new(""))
                .unwrap_err(),
            LedgerError::EmptyContent
        );
        assert_eq!(
            ledger
                .add_comment(&alice, id, &UserId::zero(), ContentRef::new("QmC"))
                .unwrap_err(),
            LedgerError::InvalidIdentity
        );
        assert_eq!(
            ledger
                .add_comment(&alice, BottleId::new(99), &alice, ContentRef::new("QmC"))
                .unwrap_err(),
            LedgerError::BottleNotFound(BottleId::new(99))
        );
    }

    #[test]
    fn promotion_requires_both_thresholds() {
        let (_clock, ledger) = ledger_with(small_thresholds());
        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");

        // Two likes meet the like threshold; no comment yet.
        ledger.like_bottle(&alice, id, &UserId::derive(b"l1")).unwrap();
        ledger.like_bottle(&alice, id, &UserId::derive(b"l2")).unwrap();
        assert!(!ledger.get_bottle(id).unwrap().forever);

        // The comment completes the second dimension.
        ledger
            .add_comment(&alice, id, &alice, ContentRef::new("QmC"))
            .unwrap();
        assert!(ledger.get_bottle(id).unwrap().forever);
    }

    #[test]
    fn hundredth_like_promotes_with_reference_thresholds() {
        let (clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");

        for i in 0..4u32 {
            ledger
                .add_comment(&alice, id, &alice, ContentRef::new(format!("QmC{i}")))
                .unwrap();
        }
        for i in 0..99u32 {
            let liker = UserId::derive(format!("liker-{i}").as_bytes());
            ledger.like_bottle(&liker, id, &liker).unwrap();
        }
        assert!(!ledger.get_bottle(id).unwrap().forever);

        let last = UserId::derive(b"liker-99");
        ledger.like_bottle(&last, id, &last).unwrap();
        let bottle = ledger.get_bottle(id).unwrap();
        assert!(bottle.forever);
        assert_eq!(bottle.like_count, 100);
        assert_eq!(bottle.comment_count, 4);

        // Forever exempts the bottle from expiration, permanently.
        clock.advance(PERIOD + PERIOD);
        assert!(!ledger.is_expired(id).unwrap());
        let late = UserId::derive(b"latecomer");
        assert_eq!(ledger.like_bottle(&late, id, &late).unwrap(), 101);
    }

    #[test]
    fn direct_promotion_is_one_way() {
        let (clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");

        ledger.promote(&alice, id).unwrap();
        assert!(ledger.get_bottle(id).unwrap().forever);

        let error = ledger.promote(&alice, id).unwrap_err();
        assert_eq!(error, LedgerError::AlreadyForever(id));

        // Threshold re-evaluation on later engagement is a no-op, not an
        // error.
        let bob = UserId::derive(b"bob");
        ledger.like_bottle(&bob, id, &bob).unwrap();

        clock.advance(PERIOD + Duration::from_secs(1));
        assert!(!ledger.is_expired(id).unwrap());
    }

    #[test]
    fn promote_rejects_unknown_bottle() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        assert_eq!(
            ledger.promote(&alice, BottleId::new(5)).unwrap_err(),
            LedgerError::BottleNotFound(BottleId::new(5))
        );
    }

    #[test]
    fn promote_with_counts_trusts_the_caller_only() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");

        // Internal counters are zero; the supplied counts alone decide.
        let error = ledger
            .promote_with_counts(&alice, id, 99, 4)
            .unwrap_err();
        assert_eq!(
            error,
            LedgerError::ThresholdsNotMet {
                likes: 99,
                comments: 4
            }
        );
        assert!(!ledger.get_bottle(id).unwrap().forever);

        ledger.promote_with_counts(&alice, id, 100, 4).unwrap();
        assert!(ledger.get_bottle(id).unwrap().forever);

        let error = ledger
            .promote_with_counts(&alice, id, 200, 8)
            .unwrap_err();
        assert_eq!(error, LedgerError::AlreadyForever(id));
    }

    #[test]
    fn content_can_be_corrected_even_after_expiry() {
        let (clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");

        clock.advance(PERIOD + Duration::from_secs(1));
        assert!(ledger.is_expired(id).unwrap());

        ledger
            .update_content(&alice, id, ContentRef::new("Qm1-reindexed"))
            .unwrap();
        assert_eq!(
            ledger.get_bottle(id).unwrap().content,
            ContentRef::new("Qm1-reindexed")
        );

        assert_eq!(
            ledger
                .update_content(&alice, id, ContentRef::new(""))
                .unwrap_err(),
            LedgerError::EmptyContent
        );
        assert_eq!(
            ledger
                .update_content(&alice, BottleId::new(9), ContentRef::new("Qm"))
                .unwrap_err(),
            LedgerError::BottleNotFound(BottleId::new(9))
        );
    }

    #[test]
    fn reverse_index_tracks_creators_in_order() {
        let (_clock, ledger) = open_ledger();
        let alice = UserId::derive(b"alice");
        let bob = UserId::derive(b"bob");

        let a1 = create(&ledger, &alice, "QmA1");
        let b1 = create(&ledger, &bob, "QmB1");
        let a2 = create(&ledger, &alice, "QmA2");

        assert_eq!(ledger.user_bottles(&alice).unwrap(), vec![a1, a2]);
        assert_eq!(ledger.user_bottles(&bob).unwrap(), vec![b1]);
        assert!(ledger
            .user_bottles(&UserId::derive(b"nobody"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn reads_reject_unknown_ids() {
        let (_clock, ledger) = open_ledger();
        assert_eq!(
            ledger.get_bottle(BottleId::new(1)).unwrap_err(),
            LedgerError::BottleNotFound(BottleId::new(1))
        );
        assert_eq!(
            ledger.get_comment(CommentId::new(1)).unwrap_err(),
            LedgerError::CommentNotFound(CommentId::new(1))
        );
        assert_eq!(
            ledger.bottle_comments(BottleId::new(1)).unwrap_err(),
            LedgerError::BottleNotFound(BottleId::new(1))
        );
        assert_eq!(
            ledger
                .has_liked(BottleId::new(1), &UserId::derive(b"bob"))
                .unwrap_err(),
            LedgerError::BottleNotFound(BottleId::new(1))
        );
        assert_eq!(
            ledger.is_expired(BottleId::new(1)).unwrap_err(),
            LedgerError::BottleNotFound(BottleId::new(1))
        );
    }

    #[test]
    fn trusted_accounting_skips_uniqueness() {
        let policy = LedgerPolicy {
            like_accounting: LikeAccounting::Trusted,
            access: AccessPolicy::SingleWriter(writer()),
            ..Default::default()
        };
        let (_clock, ledger) = ledger_with(policy);
        let alice = UserId::derive(b"alice");
        let id = ledger
            .create_bottle(&writer(), &alice, ContentRef::new("Qm1"))
            .unwrap();

        // The same identity may like twice; the writer's accounting is
        // trusted.
        assert_eq!(ledger.like_bottle(&writer(), id, &alice).unwrap(), 1);
        assert_eq!(ledger.like_bottle(&writer(), id, &alice).unwrap(), 2);
        assert!(!ledger.has_liked(id, &alice).unwrap());

        assert_eq!(ledger.unlike_bottle(&writer(), id, &alice).unwrap(), 1);
        assert_eq!(ledger.unlike_bottle(&writer(), id, &alice).unwrap(), 0);
        assert_eq!(
            ledger.unlike_bottle(&writer(), id, &alice).unwrap_err(),
            LedgerError::CounterUnderflow(id)
        );
    }

    #[test]
    fn events_flow_through_the_bus() {
        let bus = Arc::new(EventBus::default());
        let mut stream = bus.subscribe(EventFilter::default());
        let clock = Arc::new(ManualClock::starting_at(Timestamp::from_millis(START_MS)));
        let ledger = InMemoryLedger::new(small_thresholds(), clock, bus);

        let alice = UserId::derive(b"alice");
        let id = create(&ledger, &alice, "Qm1");
        ledger.like_bottle(&alice, id, &UserId::derive(b"l1")).unwrap();
        ledger.like_bottle(&alice, id, &UserId::derive(b"l2")).unwrap();
        ledger
            .add_comment(&alice, id, &alice, ContentRef::new("QmC"))
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = stream.try_recv() {
            assert!(event.verify_integrity());
            assert_eq!(event.bottle, id);
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::BottleCreated,
                EventKind::BottleLiked,
                EventKind::BottleLiked,
                EventKind::CommentAdded,
                EventKind::BecameForever,
            ]
        );
    }

    proptest::proptest! {
        /// Counter exactness: after any sequence of like/unlike attempts,
        /// the like count equals accepted likes minus accepted unlikes and
        /// never goes negative.
        #[test]
        fn like_count_is_exact_under_any_sequence(
            ops in proptest::collection::vec((0usize..6, proptest::bool::ANY), 0..60)
        ) {
            let (_clock, ledger) = open_ledger();
            let alice = UserId::derive(b"alice");
            let id = create(&ledger, &alice, "Qm1");
            let users: Vec<UserId> = (0..6)
                .map(|i| UserId::derive(format!("user-{i}").as_bytes()))
                .collect();

            let mut model: std::collections::HashSet<usize> = std::collections::HashSet::new();
            for (user, like) in ops {
                if like {
                    match ledger.like_bottle(&users[user], id, &users[user]) {
                        Ok(_) => { proptest::prop_assert!(model.insert(user)); }
                        Err(LedgerError::AlreadyLiked { .. }) => {
                            proptest::prop_assert!(model.contains(&user));
                        }
                        Err(e) => return Err(proptest::test_runner::TestCaseError::fail(
                            format!("unexpected error: {e}"),
                        )),
                    }
                } else {
                    match ledger.unlike_bottle(&users[user], id, &users[user]) {
                        Ok(_) => { proptest::prop_assert!(model.remove(&user)); }
                        Err(LedgerError::NotLiked { .. }) => {
                            proptest::prop_assert!(!model.contains(&user));
                        }
                        Err(e) => return Err(proptest::test_runner::TestCaseError::fail(
                            format!("unexpected error: {e}"),
                        )),
                    }
                }
                let count = ledger.get_bottle(id).unwrap().like_count;
                proptest::prop_assert_eq!(count, model.len() as u64);
            }
        }
    }
}
