use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Millisecond wall-clock timestamp.
///
/// All expiration math in the ledger is done on `Timestamp` values read from
/// an injected [`Clock`]. Two operations in the same logical instant may
/// observe the same timestamp; expiration comparisons are defined with
/// closed/open bounds so this is acceptable.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from milliseconds since the UNIX epoch.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since the UNIX epoch.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// The zero timestamp (epoch).
    pub const fn zero() -> Self {
        Self(0)
    }

    /// This timestamp advanced by `duration`, saturating at `u64::MAX`.
    pub fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_millis() as u64))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ms)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Injected time source.
///
/// The ledger reads time exactly once per operation through this trait. It
/// never owns a timer of its own, which keeps expiration a lazily computed
/// read-time fact and makes time fully controllable in tests.
pub trait Clock: Send + Sync {
    /// The current time. Implementations must never go backwards.
    fn now(&self) -> Timestamp;
}

/// Wall-clock [`Clock`] for production use.
///
/// Reads [`SystemTime`] and pins the result to the highest value handed out
/// so far, so observed timestamps never decrease even if the OS clock steps
/// backwards.
#[derive(Default)]
pub struct SystemClock {
    last_ms: AtomicU64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let floor = self.last_ms.fetch_max(wall, Ordering::AcqRel);
        Timestamp::from_millis(wall.max(floor))
    }
}

/// Manually driven [`Clock`] for tests and simulations.
///
/// Starts at zero (or a chosen instant) and only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// A clock frozen at the zero timestamp.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock frozen at the given instant.
    pub fn starting_at(now: Timestamp) -> Self {
        Self {
            now_ms: AtomicU64::new(now.as_millis()),
        }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.now_ms
            .fetch_add(duration.as_millis() as u64, Ordering::AcqRel);
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, now: Timestamp) {
        self.now_ms.store(now.as_millis(), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now_ms.load(Ordering::Acquire))
    }
}
