//! Error handling
//!
//! Defines the protocol error vocabulary and the classification of host errors into it.

pub mod handlers;
pub mod types;

pub use types::*;
