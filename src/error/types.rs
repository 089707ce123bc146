//! Error types
//!
//! Domain-specific error types for session setup, path resolution and the
//! protocol-facing operation results.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// SFTP status codes handed back to the protocol engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StatusCode {
    Ok = 0,
    NoSuchFile = 2,
    PermissionDenied = 3,
    Failure = 4,
    BadMessage = 5,
    OpUnsupported = 8,
}

impl StatusCode {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Errors surfaced to the protocol engine.
///
/// Carries no host detail; whatever caused a `Failure` has already been logged
/// where it was classified.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SftpError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("no such file")]
    NoSuchFile,
    #[error("path resolves outside of the tenant root")]
    PathEscape,
    #[error("operation unsupported")]
    OpUnsupported,
    #[error("failure")]
    Failure,
}

impl SftpError {
    /// Status code reported to the client. Escapes look like a missing file.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SftpError::PermissionDenied => StatusCode::PermissionDenied,
            SftpError::NoSuchFile | SftpError::PathEscape => StatusCode::NoSuchFile,
            SftpError::OpUnsupported => StatusCode::OpUnsupported,
            SftpError::Failure => StatusCode::Failure,
        }
    }
}

/// Path resolution errors
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("path resolves outside of the tenant root: {}", path.display())]
    Escape { path: PathBuf },

    #[error("tenant root is unavailable: {0}")]
    RootUnavailable(#[source] io::Error),

    #[error("failed to resolve {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Session setup errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no tenant identifier supplied by the authorization provider")]
    MissingTenant,

    #[error("invalid tenant identifier: {0:?}")]
    InvalidTenant(String),
}
