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
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
pub struct UserLogin {
    email: String,
    password: String,
    app_id: i32,
}

impl std::fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLogin")
            .field("email", &self.email)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Deserialize)]
pub struct LoggedIn {
    pub token: String,
}

#[utoipa::path(
    post,
    path= "/user/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful", body = LoggedIn, content_type = "application/json"),
        (status = 400, description = "Missing or malformed email, password or app_id", body = super::ErrorBody),
        (status = 401, description = "Invalid credentials", body = super::ErrorBody),
        (status = 404, description = "Unknown app", body = super::ErrorBody),
    ),
    tag= "login"
)]
#[instrument(skip(auth))]
pub async fn login(
    auth: Extension<Arc<Authenticator>>,
    payload: Option<Json<UserLogin>>,
) -> Response {
    let user: UserLogin = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    if user.email.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "email is required");
    }

    if !valid_email(&user.email) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid email");
    }

    if user.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "password is required");
    }

    if user.app_id == 0 {
        return error_response(StatusCode::BAD_REQUEST, "app_id is required");
    }

    match auth.login(&user.email, &user.password, user.app_id).await {
        Ok(token) => (StatusCode::OK, Json(LoggedIn { token })).into_response(),
        Err(e) => auth_error_response(&e),
    }
}
