//! Public auth endpoints: login, refresh, register, password reset, and
//! the federated login callback.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::AppState;
use crate::model::{
    CreateUser, ForgotPasswordRequest, LoginRequest, RefreshRequest, ResetPasswordRequest,
};
use crate::service::AuthError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/login/{provider}/callback", get(oauth_callback))
        .route("/refresh-token", post(refresh_token))
        .route("/register", post(register))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// POST /auth/login — password login, returns an access/refresh pair.
async fn login(
    State(svc): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let pair = svc.login(&body.email, &body.password)?;
    Ok(Json(serde_json::to_value(pair).map_err(internal)?))
}

/// POST /auth/refresh-token — rotate a refresh token.
async fn refresh_token(
    State(svc): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let pair = svc.refresh(&body.refresh_token)?;
    Ok(Json(serde_json::to_value(pair).map_err(internal)?))
}

/// POST /auth/register — create a password-based account.
async fn register(
    State(svc): State<AppState>,
    Json(body): Json<CreateUser>,
) -> Result<(StatusCode, Json<serde_json::Value>), AuthError> {
    let user = svc.register_user(body)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(user).map_err(internal)?),
    ))
}

/// POST /auth/forgot-password — start a password reset.
async fn forgot_password(
    State(svc): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    svc.request_password_reset(&body.email)?;
    Ok(Json(serde_json::json!({
        "message": "password reset email sent"
    })))
}

/// POST /auth/reset-password — redeem a reset token.
async fn reset_password(
    State(svc): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    svc.reset_password(&body.token, &body.new_password)?;
    Ok(Json(serde_json::json!({
        "message": "password has been reset"
    })))
}

/// GET /auth/login/{provider}/callback?code=... — federated login.
///
/// Exchanges the authorization code, logs the asserted identity in
/// (provisioning on first sight), and sends a 302 to the frontend
/// dashboard with the access token in the query string.
async fn oauth_callback(
    State(svc): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, AuthError> {
    let claims = svc.oauth_exchange(&provider, &params.code).await?;
    let token = svc.federated_login(claims)?;

    let url = format!("{}/dashboard?token={}", svc.config().base_url_front, token);
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}

fn internal(e: serde_json::Error) -> AuthError {
    tracing::error!(error = %e, "response serialization failed");
    AuthError::Internal("failed to encode response".to_string())
}

#[derive(serde::Deserialize)]
struct CallbackParams {
    code: String,
    #[allow(dead_code)]
    #[serde(default)]
    state: String,
}
