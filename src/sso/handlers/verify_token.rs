use super::{auth_error_response, error_response};
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
pub struct TokenVerify {
    token: String,
    app_id: i32,
}

impl std::fmt::Debug for TokenVerify {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerify")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Verified {
    pub user_id: i64,
    pub app_id: i32,
    pub expires_at: i64,
}

#[utoipa::path(
    post,
    path= "/token/verify",
    request_body = TokenVerify,
    responses (
        (status = 200, description = "Token is valid", body = Verified, content_type = "application/json"),
        (status = 400, description = "Missing token or app_id", body = super::ErrorBody),
        (status = 401, description = "Token is malformed, forged or expired", body = super::ErrorBody),
        (status = 404, description = "Unknown app", body = super::ErrorBody),
    ),
    tag= "token"
)]
#[instrument(skip(auth))]
pub async fn verify(
    auth: Extension<Arc<Authenticator>>,
    payload: Option<Json<TokenVerify>>,
) -> Response {
    let request: TokenVerify = match payload {
        Some(Json(payload)) => payload,
        None => return error_response(StatusCode::BAD_REQUEST, "Missing payload"),
    };

    match auth.verify_token(&request.token, request.app_id).await {
        Ok(claims) => (
            StatusCode::OK,
            Json(Verified {
                user_id: claims.uid,
                app_id: claims.app_id,
                expires_at: claims.exp,
            }),
        )
            .into_response(),
        Err(e) => auth_error_response(&e),
    }
}
