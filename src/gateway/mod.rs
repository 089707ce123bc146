//! Access gateway
//!
//! Maps protocol-level file operations onto host filesystem calls:
//! permission check, path resolution, the call itself, error classification.

pub mod handler;
pub mod operations;
pub mod registry;
pub mod request;
pub mod results;

pub use handler::AccessGateway;
pub use registry::LockRegistry;
pub use request::{FileAttrs, Method, Request};
pub use results::{CommandOutcome, FileReader, FileWriter, Response};
