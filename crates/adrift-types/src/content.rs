use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque reference to externally stored content.
///
/// The ledger never inspects or stores the content itself. A `ContentRef`
/// is just the pointer handed back by whatever content-addressed store the
/// deployment uses (e.g. an IPFS CID like `"Qm..."`). The ledger only
/// requires that the reference is non-empty at creation time; emptiness is
/// validated at the operation boundary so the error surfaces as a ledger
/// rejection rather than a construction failure.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    /// Wrap a reference string.
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the reference is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ContentRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContentRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Debug for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentRef({:?})", self.0)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
