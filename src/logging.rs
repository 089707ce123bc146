//! Logging setup
//!
//! `RUST_LOG` wins when set; otherwise the level follows the debug flag.

use env_logger::{Builder, Env};

use crate::config::ServerConfig;

pub fn setup_logging(config: &ServerConfig) {
    Builder::from_env(Env::default().default_filter_or(config.log_filter()))
        .format_timestamp_millis()
        .init();
}
