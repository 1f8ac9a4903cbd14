use super::{auth_error_response, error_response, valid_email};
use crate::auth::Authenticator;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct UserRegister {
    email: String,
    password: String,
}

impl std::fmt::Debug for UserRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegister")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Registered {
    pub user_id: i64,
}

#[utoipa::path(
    post,
    path= "/user/register",
    request_body = UserRegister,
    responses (
        (status = 201, description = "Registration successful", body = Registered, content_type = "application/json"),
        (status = 400, description = "Missing or invalid email or password", body = super::ErrorBody),
        (status = 409, description = "User with the specified email already exists", body = super::ErrorBody),
    ),
    tag= "register"
)]
#[instrument(skip(auth))]
pub async fn register(
    auth: Extension<Arc<Authenticator>>,
    payload: Option<Json<UserRegister>>,
) -> Response {
    let user: UserRegister = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    if user.email.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "email is required");
    }

    if user.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "password is required");
    }

    if !valid_email(&user.email) {
        debug!("Invalid email");

        return error_response(StatusCode::BAD_REQUEST, "Invalid email");
    }

    match auth.register(&user.email, &user.password).await {
        Ok(user_id) => (StatusCode::CREATED, Json(Registered { user_id })).into_response(),
        Err(e) => auth_error_response(&e),
    }
}
