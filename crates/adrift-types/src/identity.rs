use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Persistent identity for a ledger participant (creator, liker, commenter,
/// or the authorized writer).
///
/// A `UserId` is a 32-byte value, typically derived deterministically from
/// account key material using BLAKE3 via [`UserId::derive`]. The same
/// material always produces the same identity. The all-zero value is
/// reserved as the null identity and is rejected by every ledger operation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId([u8; 32]);

impl UserId {
    /// Derive a `UserId` from arbitrary key material.
    pub fn derive(material: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"adrift-user-v1:");
        hasher.update(material);
        Self(*hasher.finalize().as_bytes())
    }

    /// Create an ephemeral (random) `UserId` for tests and demos.
    pub fn ephemeral() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self::derive(&bytes)
    }

    /// The null (all-zero) identity. Rejected by every ledger operation.
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Returns `true` if this is the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("usr:{}", hex::encode(&self.0[..4]))
    }

    /// Parse from a hex string (64 hex characters, optional `usr:` prefix).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("usr:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Create from raw bytes. Use [`UserId::derive`] for production code.
    pub const fn from_raw(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.short_id())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}
