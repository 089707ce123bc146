//! Error handlers
//!
//! Classifies host errors at the point of the syscall so nothing reaches the
//! protocol engine unclassified.

use crate::error::types::{ResolveError, SftpError};
use crate::session::SessionContext;
use log::{error, warn};
use std::io;

/// Classify a host I/O error. Missing entries keep their own code, anything
/// else is logged with full detail and collapsed into `Failure`.
pub fn classify_io(
    session: &SessionContext,
    action: &str,
    source: &str,
    err: io::Error,
) -> SftpError {
    if err.kind() == io::ErrorKind::NotFound {
        return SftpError::NoSuchFile;
    }

    error!(
        "[{}] {} failed (source: {}): {}",
        session.identity(),
        action,
        source,
        err
    );
    SftpError::Failure
}

/// Classify a resolution failure. Escapes are logged apart from generic
/// failures so they stand out in security audits.
pub fn classify_resolve(session: &SessionContext, source: &str, err: ResolveError) -> SftpError {
    match err {
        ResolveError::Escape { .. } => {
            warn!(
                "[{}] blocked path escape (source: {}): {}",
                session.identity(),
                source,
                err
            );
            SftpError::PathEscape
        }
        other => {
            error!(
                "[{}] path resolution failed (source: {}): {}",
                session.identity(),
                source,
                other
            );
            SftpError::Failure
        }
    }
}
