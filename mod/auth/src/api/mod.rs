//! HTTP surface of the auth module.
//!
//! Public endpoints (login, refresh, register, password reset, federated
//! callback) sit next to protected ones gated by the [`middleware`]
//! layers: `authenticate` turns a missing/invalid access token into a 401,
//! `require_permissions` turns a missing permission into a 403.

mod auth;
mod me;
pub mod middleware;
mod roles;

use std::sync::Arc;

use axum::Router;

use crate::service::role::PERM_ASSIGN_ROLES;
use crate::service::AuthService;

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Permissions accepted for role administration.
const ASSIGN_ROLES_PERMS: &[&str] = &[PERM_ASSIGN_ROLES];

/// Build the complete auth API router, rooted at `/auth`.
pub fn build_router(svc: Arc<AuthService>) -> Router {
    let admin = roles::routes().route_layer(axum::middleware::from_fn_with_state(
        (svc.clone(), ASSIGN_ROLES_PERMS),
        middleware::require_permissions,
    ));

    let protected = Router::new()
        .merge(me::routes())
        .merge(admin)
        .route_layer(axum::middleware::from_fn_with_state(
            svc.clone(),
            middleware::authenticate,
        ));

    Router::new()
        .nest("/auth", auth::routes().merge(protected))
        .with_state(svc)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    use crate::service::role::ADMIN_ROLE_NAME;
    use crate::service::testing::test_service;
    use crate::service::AuthService;

    fn app() -> (Router, Arc<AuthService>) {
        let svc = test_service();
        svc.ensure_default_roles().unwrap();
        (super::build_router(svc.clone()), svc)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_and_login(app: &Router, email: &str, pw: &str) -> serde_json::Value {
        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/register",
                serde_json::json!({"name": "Test", "email": email, "password": pw}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/login",
                serde_json::json!({"email": email, "password": pw}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        body_json(res).await
    }

    #[tokio::test]
    async fn test_me_without_header_is_401() {
        let (app, _) = app();
        let res = app
            .oneshot(Request::builder().uri("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_with_garbled_token_is_401() {
        let (app, _) = app();
        let res = app
            .oneshot(get_with_token("/auth/me", "garbage"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_login_me_flow() {
        let (app, _) = app();
        let pair = register_and_login(&app, "flow@x.com", "pw123").await;
        let token = pair["token"].as_str().unwrap();
        assert!(pair["refreshToken"].as_str().is_some());

        let res = app.oneshot(get_with_token("/auth/me", token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let me = body_json(res).await;
        assert_eq!(me["email"], "flow@x.com");
        // Wire fields are camelCase.
        assert!(me["createdAt"].is_string());
        assert!(me.get("created_at").is_none());
        // The password hash never leaves the server.
        assert!(me.get("passwordHash").is_none() && me.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_401() {
        let (app, _) = app();
        register_and_login(&app, "a@x.com", "right").await;

        let res = app
            .oneshot(post_json(
                "/auth/login",
                serde_json::json!({"email": "a@x.com", "password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_rotation_over_http() {
        let (app, _) = app();
        let pair = register_and_login(&app, "rot@x.com", "pw").await;
        let old = pair["refreshToken"].as_str().unwrap().to_string();

        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/refresh-token",
                serde_json::json!({"refreshToken": old}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let rotated = body_json(res).await;
        assert_ne!(rotated["refreshToken"].as_str().unwrap(), old);

        // Replaying the superseded token fails.
        let res = app
            .oneshot(post_json(
                "/auth/refresh-token",
                serde_json::json!({"refreshToken": old}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_assign_role_permission_gate() {
        let (app, svc) = app();
        let member = register_and_login(&app, "member@x.com", "pw").await;
        let member_token = member["token"].as_str().unwrap();
        let member_id = {
            let user = svc.store.find_user_by_email("member@x.com").unwrap().unwrap();
            user.id
        };

        // A regular user is authenticated but lacks admin:assign_roles.
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/auth/users/{}/roles", member_id))
                    .header("authorization", format!("Bearer {}", member_token))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"role": ADMIN_ROLE_NAME}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        // Promote an admin directly through the store, then the same
        // request succeeds.
        let admin = register_and_login(&app, "admin@x.com", "pw").await;
        let admin_token = admin["token"].as_str().unwrap();
        let admin_role = svc.store.find_role_by_name(ADMIN_ROLE_NAME).unwrap().unwrap();
        let admin_user = svc.store.find_user_by_email("admin@x.com").unwrap().unwrap();
        svc.store
            .create_user_role_link(&admin_user.id, &admin_role.id)
            .unwrap();

        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/auth/users/{}/roles", member_id))
                    .header("authorization", format!("Bearer {}", admin_token))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"role": ADMIN_ROLE_NAME}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_is_404() {
        let (app, _) = app();
        let res = app
            .oneshot(post_json(
                "/auth/forgot-password",
                serde_json::json!({"email": "ghost@x.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reset_password_flow_over_http() {
        let (app, svc) = app();
        register_and_login(&app, "reset@x.com", "old-pw").await;

        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/forgot-password",
                serde_json::json!({"email": "reset@x.com"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let token = svc
            .store
            .find_user_by_email("reset@x.com")
            .unwrap()
            .unwrap()
            .reset_token
            .unwrap();

        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/reset-password",
                serde_json::json!({"token": token.as_str(), "newPassword": "new-pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        // Reused token is rejected.
        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/reset-password",
                serde_json::json!({"token": token.as_str(), "newPassword": "again"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .oneshot(post_json(
                "/auth/login",
                serde_json::json!({"email": "reset@x.com", "password": "new-pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oauth_callback_redirects_with_access_token() {
        use std::collections::HashMap;

        use crate::model::IdentityClaims;
        use crate::provider::{IdentityProvider, ProviderError};
        use crate::service::testing::RecordingMailer;
        use crate::service::AuthConfig;
        use crate::store::SqliteStore;

        struct StaticProvider;

        #[async_trait::async_trait]
        impl IdentityProvider for StaticProvider {
            async fn exchange(&self, _code: &str) -> Result<IdentityClaims, ProviderError> {
                Ok(IdentityClaims {
                    email: Some("fed@x.com".to_string()),
                    name: Some("Fed".to_string()),
                    picture: None,
                })
            }
        }

        let mut providers: HashMap<String, Arc<dyn IdentityProvider>> = HashMap::new();
        providers.insert("google".to_string(), Arc::new(StaticProvider));
        let svc = AuthService::with_providers(
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(RecordingMailer::default()),
            providers,
            AuthConfig::default(),
        )
        .unwrap();
        svc.ensure_default_roles().unwrap();
        let app = super::build_router(svc.clone());

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/auth/login/google/callback?code=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::FOUND);
        let location = res.headers().get("location").unwrap().to_str().unwrap();
        let prefix = format!("{}/dashboard?token=", svc.config().base_url_front);
        assert!(location.starts_with(&prefix));
        // The query string carries a verifiable access token.
        let token = &location[prefix.len()..];
        let user = svc.store.find_user_by_email("fed@x.com").unwrap().unwrap();
        assert_eq!(svc.verify_access(token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_oauth_callback_unknown_provider_is_404() {
        let (app, _) = app();
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/auth/login/github/callback?code=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
