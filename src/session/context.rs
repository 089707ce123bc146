//! Module `context`
//!
//! Defines the `SessionContext` built once per connection from the
//! authorization provider's grant and the startup configuration.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use crate::config::{OwnerConfig, ServerConfig};
use crate::error::SessionError;
use crate::session::permissions::{Permission, PermissionSet};

/// What the authorization provider hands over once a credential is accepted.
#[derive(Debug, Clone, Default)]
pub struct AccessGrant {
    /// Tenant whose data directory the session is confined to
    pub tenant_id: Option<String>,
    /// User label, only used to correlate log lines
    pub user: Option<String>,
    /// Comma-delimited capability tokens
    pub permissions: String,
    pub remote_addr: Option<SocketAddr>,
}

/// Label identifying a session in log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user: String,
    remote_addr: Option<SocketAddr>,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remote_addr {
            Some(addr) => write!(f, "{}@{}", self.user, addr),
            None => write!(f, "{}@local", self.user),
        }
    }
}

/// Immutable state of one connection.
///
/// Every path the gateway touches on behalf of this session is resolved
/// against `root_dir` first.
#[derive(Debug, Clone)]
pub struct SessionContext {
    root_dir: PathBuf,
    permissions: PermissionSet,
    read_only: bool,
    owner: OwnerConfig,
    identity: Identity,
}

impl SessionContext {
    /// Establish a session from a grant. The tenant root is `<data_root>/<tenant_id>`.
    ///
    /// A grant without a tenant means the caller is not the provider we expect,
    /// which is fatal for the session.
    pub fn establish(config: &ServerConfig, grant: AccessGrant) -> Result<Self, SessionError> {
        let tenant = grant.tenant_id.ok_or(SessionError::MissingTenant)?;
        validate_tenant_id(&tenant)?;

        Ok(Self {
            root_dir: config.data_root_path().join(&tenant),
            permissions: PermissionSet::parse(&grant.permissions),
            read_only: config.read_only,
            owner: config.owner,
            identity: Identity {
                user: grant.user.unwrap_or_else(|| "anonymous".to_string()),
                remote_addr: grant.remote_addr,
            },
        })
    }

    /// Build a session directly around a root directory.
    pub fn new(root_dir: impl Into<PathBuf>, permissions: PermissionSet, read_only: bool) -> Self {
        Self {
            root_dir: root_dir.into(),
            permissions,
            read_only,
            owner: OwnerConfig::default(),
            identity: Identity {
                user: "anonymous".to_string(),
                remote_addr: None,
            },
        }
    }

    /// Replace the owner applied after create and modify operations.
    pub fn with_owner(mut self, owner: OwnerConfig) -> Self {
        self.owner = owner;
        self
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Returns the tenant root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns whether every mutating operation must be rejected.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Returns the owner applied to entries created or modified for this session.
    pub fn owner(&self) -> OwnerConfig {
        self.owner
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns whether the session may perform an action requiring `permission`.
    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }
}

/// A tenant id becomes one directory name under the data root, nothing more.
fn validate_tenant_id(tenant: &str) -> Result<(), SessionError> {
    let mut components = Path::new(tenant).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !tenant.contains('/') => Ok(()),
        _ => Err(SessionError::InvalidTenant(tenant.to_string())),
    }
}
