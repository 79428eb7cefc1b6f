use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a bottle record.
///
/// Bottle ids are positive integers assigned densely by the ledger in
/// creation order, starting at 1. An id is never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BottleId(u64);

impl BottleId {
    /// Wrap a raw id value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BottleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "btl:{}", self.0)
    }
}

/// Identifier of a comment record.
///
/// Comment ids run on their own dense counter, independent of bottle ids,
/// also starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommentId(u64);

impl CommentId {
    /// Wrap a raw id value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmt:{}", self.0)
    }
}
