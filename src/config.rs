//! Configuration management for the RAX SFTP gateway
//!
//! The configuration is loaded once at startup and handed by reference to
//! whatever builds sessions. Nothing re-reads it afterwards.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_OWNER_ID: u32 = 1000;

/// Complete gateway configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Lower the default log filter to `debug`
    #[serde(default)]
    pub debug: bool,

    /// Directory holding one sub-directory per tenant
    pub data_root: String,

    /// If set, no write actions are allowed through the gateway
    #[serde(default)]
    pub read_only: bool,

    /// Owner assigned to entries the gateway creates or modifies
    #[serde(default)]
    pub owner: OwnerConfig,
}

/// Unprivileged owner applied after create/modify operations
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct OwnerConfig {
    pub uid: u32,
    pub gid: u32,
}

impl Default for OwnerConfig {
    fn default() -> Self {
        Self {
            uid: DEFAULT_OWNER_ID,
            gid: DEFAULT_OWNER_ID,
        }
    }
}

impl ServerConfig {
    /// Build a configuration in code rather than from disk.
    pub fn new(data_root: impl Into<String>) -> Self {
        Self {
            debug: false,
            data_root: data_root.into(),
            read_only: false,
            owner: OwnerConfig::default(),
        }
    }

    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_paths = [
            "/etc/rax-sftp/config", // packaged install: /etc/rax-sftp/config.toml
            "config",               // local development: ./config.toml
        ];

        let mut last_error = None;

        for config_path in &config_paths {
            match Self::build(File::with_name(config_path)) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            config::ConfigError::Message(format!(
                "no configuration found, tried: {config_paths:?}"
            ))
        }))
    }

    /// Load configuration from one explicit file, still honouring environment overrides
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        Self::build(File::from(path))
    }

    fn build<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(source)
            .add_source(
                Environment::with_prefix("RAX_SFTP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.data_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "data_root cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Get the data root as PathBuf
    pub fn data_root_path(&self) -> PathBuf {
        PathBuf::from(&self.data_root)
    }

    /// Default log filter derived from the debug flag
    pub fn log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}
