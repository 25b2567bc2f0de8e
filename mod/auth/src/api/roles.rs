use axum::extract::{Extension, Path, State};
use axum::routing::post;
use axum::{Json, Router};

use crate::api::middleware::AuthUser;
use crate::api::AppState;
use crate::service::AuthError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/users/{id}/roles", post(assign_role))
}

#[derive(serde::Deserialize)]
struct AssignRoleRequest {
    role: String,
}

/// POST /auth/users/{id}/roles — assign a role to a user.
async fn assign_role(
    State(svc): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<AssignRoleRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    svc.assign_role(&actor.id, &user_id, &body.role)?;
    Ok(Json(serde_json::json!({ "message": "role assigned" })))
}
