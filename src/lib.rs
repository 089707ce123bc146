pub mod config;
pub mod console;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod session;
pub mod storage;

pub use config::ServerConfig;
pub use error::{SftpError, StatusCode};
pub use gateway::{AccessGateway, LockRegistry, Method, Request, Response};
pub use session::{AccessGrant, Permission, PermissionSet, SessionContext};
