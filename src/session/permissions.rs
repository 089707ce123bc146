//! Capability tokens
//!
//! Flat set membership: a session may perform an action when it holds the
//! exact token or was granted everything. Tokens do not imply one another.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Token granting every capability
pub const WILDCARD_TOKEN: &str = "*";

/// A single capability handed out by the authorization provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// List directories and stat entries
    FileRead,
    /// Open files for reading
    FileReadContent,
    FileCreate,
    FileUpdate,
    FileDelete,
}

impl Permission {
    pub fn token(self) -> &'static str {
        match self {
            Permission::FileRead => "file.read",
            Permission::FileReadContent => "file.read-content",
            Permission::FileCreate => "file.create",
            Permission::FileUpdate => "file.update",
            Permission::FileDelete => "file.delete",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file.read" => Ok(Permission::FileRead),
            "file.read-content" => Ok(Permission::FileReadContent),
            "file.create" => Ok(Permission::FileCreate),
            "file.update" => Ok(Permission::FileUpdate),
            "file.delete" => Ok(Permission::FileDelete),
            other => Err(format!("unknown permission token: {other}")),
        }
    }
}

/// Capabilities granted to one session.
///
/// The wildcard is kept as its own flag rather than as a member of the set,
/// so no real token can ever collide with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    all: bool,
    granted: HashSet<Permission>,
}

impl PermissionSet {
    /// A set that grants nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the comma-delimited token list supplied at session start.
    /// Unrecognised tokens are dropped.
    pub fn parse(list: &str) -> Self {
        let mut set = Self::empty();

        for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == WILDCARD_TOKEN {
                set.all = true;
                continue;
            }
            match token.parse::<Permission>() {
                Ok(permission) => {
                    set.granted.insert(permission);
                }
                Err(e) => log::debug!("{e}"),
            }
        }

        set
    }

    pub fn grants_all(&self) -> bool {
        self.all
    }

    /// Returns whether `permission` is granted, directly or through the wildcard.
    pub fn contains(&self, permission: Permission) -> bool {
        self.all || self.granted.contains(&permission)
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            all: false,
            granted: iter.into_iter().collect(),
        }
    }
}
