//! Module `parser`
//!
//! Turns console lines into gateway requests.

use crate::gateway::{FileAttrs, Method, Request};

/// A parsed console line
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the gateway; `payload` is the text written by `put`
    Request {
        request: Request,
        payload: Option<String>,
    },
    Quit,
    Empty,
    /// Known method with missing or malformed arguments
    Invalid(String),
}

/// Parse one line: `<method> <path> [target | mode | text]`.
///
/// Unknown method names still become requests so the gateway can reject them.
pub fn parse_command(raw: &str) -> ConsoleCommand {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ConsoleCommand::Empty;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    if name.eq_ignore_ascii_case("quit") || name.eq_ignore_ascii_case("exit") {
        return ConsoleCommand::Quit;
    }

    let method = Method::from_name(name);
    let mut args = rest.splitn(2, char::is_whitespace);
    let path = args.next().unwrap_or("");
    let extra = args.next().map(str::trim).unwrap_or("");

    if path.is_empty() {
        return ConsoleCommand::Invalid(format!("{name} requires a path"));
    }

    let request = Request::new(method.clone(), path);
    let (request, payload) = match method {
        Method::Rename | Method::Symlink if extra.is_empty() => {
            return ConsoleCommand::Invalid(format!("{name} requires a target path"));
        }
        Method::Rename | Method::Symlink => (request.with_target(extra), None),
        Method::Setstat => match u32::from_str_radix(extra, 8) {
            Ok(mode) => (request.with_attrs(FileAttrs::with_mode(mode)), None),
            Err(_) => return ConsoleCommand::Invalid(format!("invalid octal mode: {extra:?}")),
        },
        Method::Put => (request, Some(extra.to_string())),
        _ => (request, None),
    };

    ConsoleCommand::Request { request, payload }
}
