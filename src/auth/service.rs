//! Login and registration.
//!
//! [`Authenticator`] holds no mutable state. It is built once, shared behind
//! an `Arc`, and composes the credential store, the secret provisioner and
//! the token codec. Argon2 work runs on the blocking pool.

use crate::auth::{
    clock::{Clock, SystemClock},
    error::{AuthError, Rejection, StoreError, TokenError},
    password::{dummy_hash, hash_password, verify_password, PasswordError},
    provisioner::{AppPolicy, SecretProvisioner},
    store::CredentialStore,
    token::{SessionClaims, TokenCodec},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, instrument};

pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    provisioner: SecretProvisioner,
    codec: TokenCodec,
    token_ttl: Duration,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("policy", &self.provisioner.policy())
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

fn require(value: &str, field: &'static str) -> Result<(), AuthError> {
    if value.is_empty() {
        return Err(AuthError::InvalidInput(field));
    }
    Ok(())
}

async fn blocking<F, T>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, PasswordError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(format!("password task failed: {e}")))?
        .map_err(|e| AuthError::Internal(e.to_string()))
}

impl Authenticator {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, policy: AppPolicy, token_ttl: Duration) -> Self {
        Self {
            store,
            provisioner: SecretProvisioner::new(policy),
            codec: TokenCodec::new(Arc::new(SystemClock)),
            token_ttl,
        }
    }

    /// Replace the time source used for token expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.codec = TokenCodec::new(clock);
        self
    }

    #[must_use]
    pub const fn policy(&self) -> AppPolicy {
        self.provisioner.policy()
    }

    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// Check credentials and issue a session token for `app_id`.
    ///
    /// An unknown email and a wrong password both end in
    /// [`AuthError::InvalidCredentials`], after the same amount of hashing.
    ///
    /// # Errors
    /// `InvalidInput`, `InvalidCredentials`, `AppNotFound`, `Timeout` or `Internal`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str, app_id: i32) -> Result<String, AuthError> {
        require(email, "email")?;
        require(password, "password")?;
        if app_id == 0 {
            return Err(AuthError::InvalidInput("app_id"));
        }

        let user = match self.store.user_by_email(email).await {
            Ok(user) => Some(user),
            Err(StoreError::NotFound) => None,
            Err(e) => {
                error!("error getting user by email: {}", e);

                return Err(AuthError::from_store(e));
            }
        };

        // a missing user is still checked against a hash of the same cost
        let stored = user.as_ref().map(|user| user.password_hash.clone());
        let candidate = password.to_string();
        let matches = blocking(move || match &stored {
            Some(hash) => verify_password(&candidate, hash),
            None => verify_password(&candidate, dummy_hash()?),
        })
        .await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                debug!("invalid credentials");

                return Err(AuthError::InvalidCredentials);
            }
        };

        let app = self
            .provisioner
            .resolve(self.store.as_ref(), app_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AuthError::AppNotFound,
                e => {
                    error!("error resolving app: {}", e);

                    AuthError::from_store(e)
                }
            })?;

        let token = self
            .codec
            .issue(user.id, app.id, &app.secret, self.token_ttl)
            .map_err(|e| {
                error!("error building session token: {}", e);

                AuthError::Internal(e.to_string())
            })?;

        info!(user_id = user.id, app_id = app.id, "user logged in");

        Ok(token)
    }

    /// Create an account and return its id. No token is issued.
    ///
    /// # Errors
    /// `InvalidInput`, `Conflict`, `Timeout` or `Internal` (including hashing failures).
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<i64, AuthError> {
        require(email, "email")?;
        require(password, "password")?;

        let plain = password.to_string();
        let hash = blocking(move || hash_password(&plain)).await?;

        let user_id = self
            .store
            .create_user(email, &hash)
            .await
            .map_err(|e| match e {
                StoreError::Conflict => AuthError::Conflict,
                e => {
                    error!("error creating new user: {}", e);

                    AuthError::from_store(e)
                }
            })?;

        info!(user_id, "created new user");

        Ok(user_id)
    }

    /// Validate a session token against the secret of `app_id`.
    ///
    /// The application is looked up without provisioning, and the token must
    /// name the same application.
    ///
    /// # Errors
    /// `InvalidInput`, `AppNotFound`, `Token`, `Timeout` or `Internal`.
    #[instrument(skip(self, token))]
    pub async fn verify_token(&self, token: &str, app_id: i32) -> Result<SessionClaims, AuthError> {
        require(token, "token")?;
        if app_id == 0 {
            return Err(AuthError::InvalidInput("app_id"));
        }

        let app = self.store.app_by_id(app_id).await.map_err(|e| match e {
            StoreError::NotFound => AuthError::AppNotFound,
            e => AuthError::from_store(e),
        })?;

        let claims = self.codec.verify(token, &app.secret)?;
        // auto-provisioned apps share one secret
        if claims.app_id != app.id {
            return Err(TokenError::Invalid(Rejection::Signature).into());
        }

        Ok(claims)
    }
}
