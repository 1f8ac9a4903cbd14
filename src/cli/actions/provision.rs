use crate::auth::{store, App, StoreConfig};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub store: StoreConfig,
    pub app_id: i32,
    pub name: Option<String>,
    pub secret: SecretString,
}

/// Create the app, or report the one already stored under the same id.
/// # Errors
/// Returns an error if the store cannot be opened or the insert fails.
pub async fn execute(args: Args) -> Result<()> {
    let store = store::open(&args.store)
        .await
        .context("Could not open credential store")?;

    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("App_{}", args.app_id));
    let requested = App::new(args.app_id, name, args.secret.expose_secret());

    let stored = store
        .provision_app(requested)
        .await
        .with_context(|| format!("Could not provision app {}", args.app_id))?;

    if stored.secret.expose_secret() == args.secret.expose_secret() {
        info!(app_id = stored.id, name = %stored.name, "App provisioned");
    } else {
        warn!(
            app_id = stored.id,
            name = %stored.name,
            "App already exists with a different secret; it was left unchanged"
        );
    }

    Ok(())
}
