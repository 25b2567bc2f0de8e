use axum::extract::{Extension, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::middleware::AuthUser;
use crate::api::AppState;
use crate::service::AuthError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/me/permissions", get(my_permissions))
}

/// GET /auth/me — the authenticated user's profile.
async fn me(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let user = svc.get_user(&user.id)?;
    serde_json::to_value(user).map(Json).map_err(|e| {
        tracing::error!(error = %e, "response serialization failed");
        AuthError::Internal("failed to encode response".to_string())
    })
}

/// GET /auth/me/permissions — the union of the user's permissions.
async fn my_permissions(
    State(svc): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let permissions = svc.user_permissions(&user.id)?;
    Ok(Json(serde_json::json!({ "items": permissions })))
}
