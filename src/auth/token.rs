//! Session tokens: HS256 JWTs bound to a user and an application.
//!
//! Tokens are keyed with the application's secret. The algorithm is pinned
//! to HS256 on both sides; expiry is checked against the injected [`Clock`]
//! rather than the library's wall clock, and a token is dead from the second
//! its `exp` is reached.

use crate::auth::{
    clock::Clock,
    error::{Rejection, TokenError},
};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// User id.
    pub uid: i64,
    pub app_id: i32,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Sign a token for `user_id` on `app_id`, valid for `ttl` from now.
    ///
    /// # Errors
    /// Returns an error if `ttl` does not fit a timestamp or signing fails.
    pub fn issue(
        &self,
        user_id: i64,
        app_id: i32,
        secret: &SecretString,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = self.clock.now();
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::Lifetime)?;
        let exp = now.checked_add_signed(ttl).ok_or(TokenError::Lifetime)?;

        let claims = SessionClaims {
            uid: user_id,
            app_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .map_err(TokenError::Encode)
    }

    /// Check signature, algorithm and expiry, and return the claims.
    ///
    /// # Errors
    /// [`TokenError::Malformed`] if the token cannot be decoded,
    /// [`TokenError::Invalid`] if it decodes but must be refused.
    pub fn verify(&self, token: &str, secret: &SecretString) -> Result<SessionClaims, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::Invalid(Rejection::Algorithm));
        }

        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            &validation,
        )
        .map_err(|err| match err.kind() {
            ErrorKind::InvalidSignature => TokenError::Invalid(Rejection::Signature),
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::Invalid(Rejection::Algorithm)
            }
            ErrorKind::ExpiredSignature => TokenError::Invalid(Rejection::Expired),
            _ => TokenError::Malformed,
        })?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(TokenError::Invalid(Rejection::Expired));
        }

        Ok(data.claims)
    }
}
