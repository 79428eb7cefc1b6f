//! Foundation types for Adrift.
//!
//! This crate provides the identity, id, content-reference, and clock types
//! used throughout the Adrift system. Every other Adrift crate depends on
//! `adrift-types`.
//!
//! # Key Types
//!
//! - [`UserId`] — Persistent participant identity derived from key material
//! - [`BottleId`] / [`CommentId`] — Dense sequential record identifiers
//! - [`ContentRef`] — Opaque reference to externally stored content
//! - [`Timestamp`] — Millisecond wall-clock value used for expiration math
//! - [`Clock`] — Injected time source ([`SystemClock`], [`ManualClock`])

pub mod content;
pub mod error;
pub mod id;
pub mod identity;
pub mod temporal;

pub use content::ContentRef;
pub use error::TypeError;
pub use id::{BottleId, CommentId};
pub use identity::UserId;
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
