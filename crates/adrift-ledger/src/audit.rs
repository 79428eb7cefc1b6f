use std::collections::HashMap;

use adrift_types::{BottleId, CommentId};

use crate::memory::InMemoryLedger;
use crate::policy::LikeAccounting;

/// Result of a ledger audit.
///
/// The counters on a bottle are defined as exact derived quantities, and
/// ids are defined as dense sequences from 1. The auditor re-derives both
/// from the raw state and reports every discrepancy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    pub bottle_count: u64,
    pub comment_count: u64,
    pub ids_dense: bool,
    pub counters_exact: bool,
    pub comments_attributed: bool,
    pub index_consistent: bool,
    pub deadlines_consistent: bool,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Returns `true` if all checks passed.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific invariant violation detected during an audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    IdGap,
    CounterMismatch,
    OrphanComment,
    MisorderedComments,
    IndexMismatch,
    DeadlineMismatch,
}

/// Ledger invariant auditor.
pub struct LedgerAuditor;

impl LedgerAuditor {
    /// Audit every record in the ledger against the structural invariants.
    pub fn audit(ledger: &InMemoryLedger) -> AuditReport {
        let state = ledger.inner.read().expect("ledger lock poisoned");
        let mut violations = Vec::new();
        let mut ids_dense = true;
        let mut counters_exact = true;
        let mut comments_attributed = true;
        let mut index_consistent = true;
        let mut deadlines_consistent = true;

        // Ids are dense from 1 with no gaps.
        for n in 1..=state.bottles.len() as u64 {
            if !state.bottles.contains_key(&BottleId::new(n)) {
                ids_dense = false;
                violations.push(Violation {
                    kind: ViolationKind::IdGap,
                    description: format!("bottle id {n} missing from a set of {}", state.bottles.len()),
                });
            }
        }
        for n in 1..=state.comments.len() as u64 {
            if !state.comments.contains_key(&CommentId::new(n)) {
                ids_dense = false;
                violations.push(Violation {
                    kind: ViolationKind::IdGap,
                    description: format!("comment id {n} missing from a set of {}", state.comments.len()),
                });
            }
        }

        // Re-derive like counts from the like set (tracked accounting only;
        // under trusted accounting the set is deliberately unmaintained).
        let mut tracked_likes: HashMap<BottleId, u64> = HashMap::new();
        for (bottle, _) in &state.likes {
            *tracked_likes.entry(*bottle).or_default() += 1;
        }

        for (id, bottle) in &state.bottles {
            if ledger.policy.like_accounting == LikeAccounting::Tracked {
                let derived = tracked_likes.get(id).copied().unwrap_or(0);
                if derived != bottle.like_count {
                    counters_exact = false;
                    violations.push(Violation {
                        kind: ViolationKind::CounterMismatch,
                        description: format!(
                            "{id}: like_count {} but {derived} tracked likes",
                            bottle.like_count
                        ),
                    });
                }
            }

            let listed = state
                .bottle_comments
                .get(id)
                .map(|list| list.len() as u64)
                .unwrap_or(0);
            if listed != bottle.comment_count {
                counters_exact = false;
                violations.push(Violation {
                    kind: ViolationKind::CounterMismatch,
                    description: format!(
                        "{id}: comment_count {} but {listed} listed comments",
                        bottle.comment_count
                    ),
                });
            }

            let expected_deadline = bottle
                .created_at
                .saturating_add(ledger.policy.expiration_period);
            if bottle.expires_at != expected_deadline {
                deadlines_consistent = false;
                violations.push(Violation {
                    kind: ViolationKind::DeadlineMismatch,
                    description: format!(
                        "{id}: expires_at {} but created_at + period is {expected_deadline}",
                        bottle.expires_at
                    ),
                });
            }

            if !state
                .user_bottles
                .get(&bottle.creator)
                .is_some_and(|list| list.contains(id))
            {
                index_consistent = false;
                violations.push(Violation {
                    kind: ViolationKind::IndexMismatch,
                    description: format!("{id} missing from creator {}'s index", bottle.creator),
                });
            }
        }

        // Every comment is attributed to an existing bottle and listed there.
        for (id, comment) in &state.comments {
            if !state.bottles.contains_key(&comment.bottle) {
                comments_attributed = false;
                violations.push(Violation {
                    kind: ViolationKind::OrphanComment,
                    description: format!("{id} references missing bottle {}", comment.bottle),
                });
            }
            if !state
                .bottle_comments
                .get(&comment.bottle)
                .is_some_and(|list| list.contains(id))
            {
                comments_attributed = false;
                violations.push(Violation {
                    kind: ViolationKind::OrphanComment,
                    description: format!("{id} not listed under bottle {}", comment.bottle),
                });
            }
        }

        // Per-bottle comment lists hold real, correctly parented comments in
        // acceptance order (ids are allocated at acceptance, so acceptance
        // order is id order).
        for (bottle, list) in &state.bottle_comments {
            for id in list {
                if !state
                    .comments
                    .get(id)
                    .is_some_and(|comment| comment.bottle == *bottle)
                {
                    comments_attributed = false;
                    violations.push(Violation {
                        kind: ViolationKind::OrphanComment,
                        description: format!("{bottle} lists {id}, which is missing or misparented"),
                    });
                }
            }
            if !list.windows(2).all(|pair| pair[0] < pair[1]) {
                comments_attributed = false;
                violations.push(Violation {
                    kind: ViolationKind::MisorderedComments,
                    description: format!("{bottle}: comment list is not in acceptance order"),
                });
            }
        }

        // The reverse index only points at bottles the user actually created.
        for (user, list) in &state.user_bottles {
            for id in list {
                if !state
                    .bottles
                    .get(id)
                    .is_some_and(|bottle| bottle.creator == *user)
                {
                    index_consistent = false;
                    violations.push(Violation {
                        kind: ViolationKind::IndexMismatch,
                        description: format!("{user}'s index lists {id}, which is missing or not theirs"),
                    });
                }
            }
        }

        AuditReport {
            bottle_count: state.bottles.len() as u64,
            comment_count: state.comments.len() as u64,
            ids_dense,
            counters_exact,
            comments_attributed,
            index_consistent,
            deadlines_consistent,
            violations,
        }
    }
}
