//! Bottle ledger core for Adrift.
//!
//! This crate is the heart of Adrift. It provides:
//! - `Bottle` and `Comment` record types
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger` implementation for tests and embedding
//! - `LedgerPolicy` covering thresholds, expiration, accounting, and access
//! - `LedgerAuditor` verification of the derived-counter and dense-id
//!   invariants
//!
//! A bottle is a user post with a fixed expiration deadline. Engagement
//! (likes, comments) is counted exactly, and a bottle that crosses both
//! engagement thresholds becomes permanent ("forever") and is exempt from
//! expiration from then on. Expiration is a lazily computed read-time fact:
//! nothing is ever deleted, and no timers run inside the ledger.

pub mod audit;
pub mod error;
pub mod memory;
pub mod policy;
pub mod records;
pub mod traits;

pub use audit::{AuditReport, LedgerAuditor, Violation, ViolationKind};
pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use policy::{
    AccessPolicy, LedgerPolicy, LikeAccounting, DEFAULT_COMMENTS_THRESHOLD,
    DEFAULT_EXPIRATION_PERIOD, DEFAULT_LIKES_THRESHOLD,
};
pub use records::{Bottle, Comment};
pub use traits::{LedgerReader, LedgerWriter};
