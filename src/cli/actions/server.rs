use crate::{
    auth::{password, store, AppPolicy, Authenticator, StoreConfig},
    sso,
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub store: StoreConfig,
    pub token_ttl: Duration,
    pub app_policy: AppPolicy,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store = store::open(&args.store)
        .await
        .context("Could not open credential store")?;

    if args.app_policy == AppPolicy::AutoProvision {
        warn!("App policy is auto-provision: unknown app ids get a placeholder secret on login");
    }

    // Pay the dummy hash cost before the first login arrives.
    tokio::task::spawn_blocking(password::dummy_hash)
        .await
        .context("dummy hash task failed")?
        .context("Could not compute dummy password hash")?;

    let auth = Arc::new(Authenticator::new(store, args.app_policy, args.token_ttl));

    sso::new(args.port, auth, shutdown_signal()).await
}

fn log_startup_args(args: &Args) {
    let storage = match &args.store {
        StoreConfig::File { path } => format!("file ({})", path.display()),
        StoreConfig::Database { timeout, .. } => {
            format!("database (timeout {}ms)", timeout.as_millis())
        }
    };

    info!(
        port = args.port,
        storage = %storage,
        token_ttl_seconds = args.token_ttl.as_secs(),
        app_policy = %args.app_policy,
        "Starting server"
    );
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
