//! Request gates: authentication (401) and permission checks (403).

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::AppState;
use crate::service::AuthError;

/// Identity of the authenticated caller, inserted by [`authenticate`] and
/// read by handlers via `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

/// JWT authentication middleware.
///
/// Requires a `Bearer` access token in the Authorization header. On
/// success the verified user id is stored as an [`AuthUser`] extension;
/// any failure is a uniform 401.
pub async fn authenticate(
    State(svc): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()) else {
        return AuthError::Unauthorized("missing authorization header".to_string())
            .into_response();
    };

    match svc.verify_access(token) {
        Ok(user_id) => {
            req.extensions_mut().insert(AuthUser { id: user_id });
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

/// Permission-check middleware. Layered after [`authenticate`]; passes if
/// the caller holds at least one of the listed permissions.
pub async fn require_permissions(
    State((svc, required)): State<(AppState, &'static [&'static str])>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(user) = req.extensions().get::<AuthUser>() else {
        // Reaching here without authenticate in front is a wiring bug.
        return AuthError::Unauthorized("missing authorization header".to_string())
            .into_response();
    };

    match svc.check_permissions(&user.id, required) {
        Ok(()) => next.run(req).await,
        Err(e) => e.into_response(),
    }
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}
