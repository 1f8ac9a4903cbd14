//! Credential storage.
//!
//! [`CredentialStore`] is the single persistence seam for users and
//! applications. Two backends implement it:
//!
//! - [`MemoryStore`]: mutex-guarded maps, optionally mirrored to a JSON file.
//! - [`PgStore`]: PostgreSQL via `sqlx`, with a per-operation deadline.
//!
//! Lookups are pure reads. Creating an application is an explicit
//! [`CredentialStore::provision_app`] call; whether a login may trigger it is
//! decided by the [`AppPolicy`](crate::auth::AppPolicy), not by the store.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::auth::{
    error::StoreResult,
    models::{App, User},
};
use anyhow::Result;
use async_trait::async_trait;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user and return its freshly assigned id.
    ///
    /// Fails with `Conflict` if the email is already registered.
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<i64>;

    /// Fails with `NotFound` if no user has this email.
    async fn user_by_email(&self, email: &str) -> StoreResult<User>;

    /// Fails with `NotFound` if the application does not exist.
    async fn app_by_id(&self, app_id: i32) -> StoreResult<App>;

    /// Insert `app` unless its id is taken, and return the stored record.
    ///
    /// An existing application is returned untouched; its secret never changes.
    async fn provision_app(&self, app: App) -> StoreResult<App>;
}

/// Which backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    File { path: PathBuf },
    Database { dsn: String, timeout: Duration },
}

/// Open the configured backend.
///
/// # Errors
/// Returns an error if the file cannot be loaded or the database is unreachable.
pub async fn open(config: &StoreConfig) -> Result<Arc<dyn CredentialStore>> {
    match config {
        StoreConfig::File { path } => {
            info!("Using file storage at {}", path.display());

            Ok(Arc::new(MemoryStore::open(path)?))
        }
        StoreConfig::Database { dsn, timeout } => {
            info!("Using database storage");

            Ok(Arc::new(PgStore::connect(dsn, *timeout).await?))
        }
    }
}
