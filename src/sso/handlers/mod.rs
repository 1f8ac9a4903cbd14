pub mod health;
pub use self::health::health;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

pub mod verify_token;
pub use self::verify_token::verify;

// common functions for the handlers
use crate::auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

#[must_use]
pub const fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials | AuthError::Token(_) => StatusCode::UNAUTHORIZED,
        AuthError::Conflict => StatusCode::CONFLICT,
        AuthError::AppNotFound => StatusCode::NOT_FOUND,
        AuthError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render an [`AuthError`] without leaking internal details.
pub fn auth_error_response(err: &AuthError) -> Response {
    let status = status_for(err);
    let message = match err {
        AuthError::Internal(_) => "internal error".to_string(),
        err => err.to_string(),
    };

    error_response(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Rejection, TokenError};

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@x.com"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("a b@x.com"));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_for(&AuthError::InvalidInput("email")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&AuthError::Token(TokenError::Invalid(Rejection::Expired))),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_for(&AuthError::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(&AuthError::AppNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(&AuthError::Timeout),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&AuthError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_are_opaque() {
        let response = auth_error_response(&AuthError::Internal("db password=x".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
