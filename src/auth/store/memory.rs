//! In-memory credential store with optional JSON file persistence.
//!
//! All state sits behind one [`parking_lot::Mutex`]: the email uniqueness
//! check, the id counter increment and the insert happen under the same
//! guard, so concurrent registrations never share an id.
//!
//! When opened with a path the whole state is rewritten after every
//! mutation (temp file, `fsync`, rename). If the write fails the mutation is
//! undone. The write happens under the lock on the calling worker thread, so
//! this backend suits small deployments; use the database store otherwise.

use crate::auth::{
    error::{StoreError, StoreResult},
    models::{App, User},
    store::CredentialStore,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs::{self, File},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    emails: HashMap<String, i64>,
    apps: BTreeMap<i32, App>,
    last_user_id: i64,
}

/// On-disk layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    last_user_id: i64,
    users: Vec<UserRecord>,
    apps: Vec<AppRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    id: i64,
    email: String,
    password_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AppRecord {
    id: i32,
    name: String,
    secret_key: String,
}

impl Inner {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            last_user_id: self.last_user_id,
            users: self
                .users
                .values()
                .map(|user| UserRecord {
                    id: user.id,
                    email: user.email.clone(),
                    password_hash: user.password_hash.clone(),
                })
                .collect(),
            apps: self
                .apps
                .values()
                .map(|app| AppRecord {
                    id: app.id,
                    name: app.name.clone(),
                    secret_key: app.secret.expose_secret().to_string(),
                })
                .collect(),
        }
    }

    fn restore(snapshot: Snapshot) -> StoreResult<Self> {
        let mut inner = Self {
            last_user_id: snapshot.last_user_id,
            ..Self::default()
        };

        for record in snapshot.users {
            if record.id <= 0 {
                return Err(StoreError::internal(format!(
                    "invalid user id in storage file: {}",
                    record.id
                )));
            }
            if record.id > inner.last_user_id {
                return Err(StoreError::internal(format!(
                    "user id {} exceeds last_user_id {}",
                    record.id, inner.last_user_id
                )));
            }
            if inner.emails.insert(record.email.clone(), record.id).is_some() {
                return Err(StoreError::internal(format!(
                    "duplicate email in storage file: {}",
                    record.email
                )));
            }
            let user = User {
                id: record.id,
                email: record.email,
                password_hash: record.password_hash,
            };
            if inner.users.insert(record.id, user).is_some() {
                return Err(StoreError::internal(format!(
                    "duplicate user id in storage file: {}",
                    record.id
                )));
            }
        }

        for record in snapshot.apps {
            if record.id <= 0 {
                return Err(StoreError::internal(format!(
                    "invalid app id in storage file: {}",
                    record.id
                )));
            }
            let app = App::new(record.id, record.name, record.secret_key);
            if inner.apps.insert(record.id, app).is_some() {
                return Err(StoreError::internal(format!(
                    "duplicate app id in storage file: {}",
                    record.id
                )));
            }
        }

        Ok(inner)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// A store that lives only as long as the process.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let inner = match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    StoreError::internal_with_source(
                        format!("failed to parse {}", path.display()),
                        e,
                    )
                })?;
                Inner::restore(snapshot)?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("storage file {} not found, starting empty", path.display());
                Inner::default()
            }
            Err(e) => {
                return Err(StoreError::internal_with_source(
                    format!("failed to read {}", path.display()),
                    e,
                ))
            }
        };

        Ok(Self {
            inner: Mutex::new(inner),
            path: Some(path),
        })
    }

    fn persist(&self, inner: &Inner) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(&inner.snapshot())
            .map_err(|e| StoreError::internal_with_source("failed to encode storage file", e))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StoreError::internal_with_source(format!("failed to create {}", parent.display()), e)
            })?;
        }

        let tmp = path.with_extension("json.tmp");
        let write = |tmp: &Path| -> std::io::Result<()> {
            let mut file = File::create(tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()
        };
        write(&tmp).map_err(|e| {
            StoreError::internal_with_source(format!("failed to write {}", tmp.display()), e)
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            StoreError::internal_with_source(format!("failed to replace {}", path.display()), e)
        })
    }

    /// Number of registered users.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.inner.lock().users.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    #[instrument(skip(self, password_hash))]
    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<i64> {
        let mut inner = self.inner.lock();

        if inner.emails.contains_key(email) {
            return Err(StoreError::Conflict);
        }

        let id = inner.last_user_id + 1;
        inner.last_user_id = id;
        inner.emails.insert(email.to_string(), id);
        inner.users.insert(
            id,
            User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
            },
        );

        if let Err(e) = self.persist(&inner) {
            inner.users.remove(&id);
            inner.emails.remove(email);
            inner.last_user_id = id - 1;

            return Err(e);
        }

        debug!("created user {}", id);

        Ok(id)
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<User> {
        let inner = self.inner.lock();

        inner
            .emails
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn app_by_id(&self, app_id: i32) -> StoreResult<App> {
        self.inner
            .lock()
            .apps
            .get(&app_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, app), fields(app_id = app.id))]
    async fn provision_app(&self, app: App) -> StoreResult<App> {
        let mut inner = self.inner.lock();

        if let Some(existing) = inner.apps.get(&app.id) {
            return Ok(existing.clone());
        }

        let id = app.id;
        inner.apps.insert(id, app.clone());

        if let Err(e) = self.persist(&inner) {
            inner.apps.remove(&id);

            return Err(e);
        }

        debug!("provisioned app {}", id);

        Ok(app)
    }
}
