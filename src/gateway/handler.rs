use log::{debug, error};
use std::fs;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::SftpError;
use crate::gateway::operations;
use crate::gateway::registry::LockRegistry;
use crate::gateway::request::{Method, Request};
use crate::gateway::results::{CommandOutcome, FileReader, FileWriter, Response};
use crate::session::SessionContext;
use crate::storage::EntryInfo;

/// Per-session entry point for the protocol engine.
///
/// - Host filesystem work runs on the blocking pool.
/// - Anything that opens, creates or mutates entries holds the session lock
///   for the whole resolve, check and act sequence. The lock is not held while
///   the caller streams through a returned reader or writer.
/// - Gateways built through a [`LockRegistry`] share that lock with every
///   other gateway of the same tenant; [`AccessGateway::new`] gets its own.
/// - List and stat run without the lock.
#[derive(Debug, Clone)]
pub struct AccessGateway {
    session: Arc<SessionContext>,
    lock: Arc<Mutex<()>>,
}

impl AccessGateway {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session: Arc::new(session),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build a gateway whose lock is shared with other sessions of the same tenant.
    pub fn with_registry(session: SessionContext, registry: &LockRegistry) -> Self {
        let root = fs::canonicalize(session.root_dir())
            .unwrap_or_else(|_| session.root_dir().to_path_buf());
        let lock = registry.lock_for(&root);
        Self {
            session: Arc::new(session),
            lock,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Route a request to the operation family that handles its method.
    pub async fn dispatch(&self, request: Request) -> Result<Response, SftpError> {
        debug!("[{}] {} {}", self.session.identity(), request.method, request.filepath);

        match request.method {
            Method::Get => self.file_read(&request.filepath).await.map(Response::Reader),
            Method::Put => self.file_write(&request.filepath).await.map(Response::Writer),
            Method::List | Method::Stat => self.file_list(request).await.map(Response::Entries),
            Method::Other(_) => Err(SftpError::OpUnsupported),
            _ => self.file_cmd(request).await.map(Response::Command),
        }
    }

    pub async fn file_read(&self, filepath: &str) -> Result<FileReader, SftpError> {
        let filepath = filepath.to_string();
        let _guard = self.lock.lock().await;
        self.blocking(move |session| operations::file_read(session, &filepath))
            .await
    }

    pub async fn file_write(&self, filepath: &str) -> Result<FileWriter, SftpError> {
        let filepath = filepath.to_string();
        let _guard = self.lock.lock().await;
        self.blocking(move |session| operations::file_write(session, &filepath))
            .await
    }

    pub async fn file_cmd(&self, request: Request) -> Result<CommandOutcome, SftpError> {
        let _guard = self.lock.lock().await;
        self.blocking(move |session| operations::file_cmd(session, &request))
            .await
    }

    pub async fn file_list(&self, request: Request) -> Result<Vec<EntryInfo>, SftpError> {
        self.blocking(move |session| operations::file_list(session, &request))
            .await
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, SftpError>
    where
        T: Send + 'static,
        F: FnOnce(&SessionContext) -> Result<T, SftpError> + Send + 'static,
    {
        let session = Arc::clone(&self.session);

        match tokio::task::spawn_blocking(move || op(&session)).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    "[{}] filesystem task did not complete: {}",
                    self.session.identity(),
                    e
                );
                Err(SftpError::Failure)
            }
        }
    }
}
