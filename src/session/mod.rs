//! Session management
//!
//! Immutable per-connection state: tenant root, granted capabilities,
//! read-only flag and the identity label used in logs.

pub mod context;
pub mod permissions;

pub use context::{AccessGrant, SessionContext};
pub use permissions::{Permission, PermissionSet};
