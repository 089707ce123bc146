//! RAX SFTP Gateway - Entry Point
//!
//! Runs a single tenant session against the local console:
//! `rax-sftp-gateway <tenant-id> [permissions] [user]`.

use log::{error, info, warn};
use std::process;

use rax_sftp_gateway::console::run_console;
use rax_sftp_gateway::logging::setup_logging;
use rax_sftp_gateway::{AccessGateway, AccessGrant, LockRegistry, ServerConfig, SessionContext};

#[tokio::main]
async fn main() {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error while loading configuration: {e}");
            process::exit(1);
        }
    };

    setup_logging(&config);
    info!("Launching SFTP gateway console...");

    let mut args = std::env::args().skip(1);
    let grant = AccessGrant {
        tenant_id: args.next(),
        permissions: args.next().unwrap_or_else(|| "*".to_string()),
        user: args.next(),
        remote_addr: None,
    };

    let session = match SessionContext::establish(&config, grant) {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to establish session: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = std::fs::create_dir_all(session.root_dir()) {
        warn!("Failed to create tenant root directory: {}", e);
    } else {
        info!(
            "Tenant root directory: {} (read-only: {})",
            session.root_dir().display(),
            session.is_read_only()
        );
    }

    let registry = LockRegistry::new();
    let gateway = AccessGateway::with_registry(session, &registry);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());

    if let Err(e) = run_console(stdin, tokio::io::stdout(), &gateway).await {
        error!("Console session failed: {}", e);
        process::exit(1);
    }
}
