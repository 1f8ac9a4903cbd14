//! Authentication core: credential storage, secret provisioning, session
//! tokens, and the [`Authenticator`] that ties them together.
//!
//! Users register with an email and a password (stored as an Argon2id hash)
//! and log in against an application. A successful login returns an HS256
//! session token signed with that application's secret; nothing about the
//! session is kept server side.

pub mod clock;
pub mod error;
pub mod models;
pub mod password;
pub mod provisioner;
pub mod service;
pub mod store;
pub mod token;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, Rejection, StoreError, StoreResult, TokenError};
pub use models::{App, User};
pub use provisioner::{AppPolicy, SecretProvisioner, PLACEHOLDER_SECRET};
pub use service::Authenticator;
pub use store::{CredentialStore, MemoryStore, PgStore, StoreConfig};
pub use token::{SessionClaims, TokenCodec};
