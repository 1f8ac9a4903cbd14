//! Error types for the credential store, the token codec and the authenticator.
//!
//! Each layer has its own closed enumeration. Callers match on them
//! exhaustively; the HTTP boundary maps [`AuthError`] to status codes.

use std::sync::Arc;
use thiserror::Error;

/// A boxed error kept for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors produced by a [`CredentialStore`](super::store::CredentialStore).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// Unique key (user email) already taken.
    #[error("record already exists")]
    Conflict,

    /// The operation exceeded its deadline.
    #[error("store operation timed out")]
    Timeout,

    #[error("store error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl StoreError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            message: message.into(),
            source: Some(Arc::new(source)),
        }
    }
}

/// Why a well-formed token was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Signature,
    Algorithm,
    Expired,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signature => write!(f, "signature mismatch"),
            Self::Algorithm => write!(f, "unexpected signing algorithm"),
            Self::Expired => write!(f, "token expired"),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token: {0}")]
    Invalid(Rejection),

    #[error("failed to sign token")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("token lifetime out of range")]
    Lifetime,
}

/// Errors returned by the [`Authenticator`](super::service::Authenticator).
///
/// `InvalidCredentials` is returned both for an unknown email and for a wrong
/// password so callers cannot probe which accounts exist.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0} is required")]
    InvalidInput(&'static str),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user already exists")]
    Conflict,

    #[error("app not found")]
    AppNotFound,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("operation timed out")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Map a store failure that is not attributable to the caller.
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Timeout => Self::Timeout,
            StoreError::NotFound | StoreError::Conflict | StoreError::Internal { .. } => {
                Self::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_timeout_maps_to_auth_timeout() {
        assert!(matches!(
            AuthError::from_store(StoreError::Timeout),
            AuthError::Timeout
        ));
    }

    #[test]
    fn store_internal_keeps_message() {
        let err = AuthError::from_store(StoreError::internal("disk full"));
        assert_eq!(err.to_string(), "internal error: store error: disk full");
    }

    #[test]
    fn invalid_input_names_field() {
        assert_eq!(
            AuthError::InvalidInput("email").to_string(),
            "email is required"
        );
    }

    #[test]
    fn token_error_is_transparent() {
        let err = AuthError::from(TokenError::Invalid(Rejection::Expired));
        assert_eq!(err.to_string(), "invalid token: token expired");
    }
}
