//! Module `request`
//!
//! Already-parsed requests as handed over by the protocol engine.

use std::fmt;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;

/// Operation kind requested by the client.
///
/// Names follow the SFTP request methods. Anything else the engine forwards
/// is kept as `Other` and rejected as unsupported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    List,
    Stat,
    Setstat,
    Rename,
    Rmdir,
    Mkdir,
    Symlink,
    Remove,
    Other(String),
}

impl Method {
    /// Map a method name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "get" => Method::Get,
            "put" => Method::Put,
            "list" => Method::List,
            "stat" => Method::Stat,
            "setstat" => Method::Setstat,
            "rename" => Method::Rename,
            "rmdir" => Method::Rmdir,
            "mkdir" => Method::Mkdir,
            "symlink" => Method::Symlink,
            "remove" => Method::Remove,
            _ => Method::Other(name.to_string()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "Get",
            Method::Put => "Put",
            Method::List => "List",
            Method::Stat => "Stat",
            Method::Setstat => "Setstat",
            Method::Rename => "Rename",
            Method::Rmdir => "Rmdir",
            Method::Mkdir => "Mkdir",
            Method::Symlink => "Symlink",
            Method::Remove => "Remove",
            Method::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// Attributes carried by setstat requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileAttrs {
    /// Raw mode, file type bits included
    pub mode: Option<u32>,
}

impl FileAttrs {
    pub fn with_mode(mode: u32) -> Self {
        Self { mode: Some(mode) }
    }

    /// Requested permission bits, zero when none were sent
    pub fn perm(&self) -> u32 {
        self.mode.unwrap_or(0) & 0o777
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_some_and(|mode| mode & S_IFMT == S_IFDIR)
    }
}

/// One inbound operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Client path, relative to the tenant's virtual root
    pub filepath: String,
    /// Second path for rename and symlink
    pub target: Option<String>,
    pub attrs: FileAttrs,
}

impl Request {
    pub fn new(method: Method, filepath: impl Into<String>) -> Self {
        Self {
            method,
            filepath: filepath.into(),
            target: None,
            attrs: FileAttrs::default(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_attrs(mut self, attrs: FileAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    /// The target path, if one was sent and is non-empty
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.is_empty())
    }
}
