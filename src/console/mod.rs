//! Console harness
//!
//! A line-oriented stand-in for the protocol engine: reads one request per
//! line, hands it to the gateway and writes the outcome back.

pub mod handler;
pub mod parser;

pub use handler::run_console;
pub use parser::{ConsoleCommand, parse_command};
