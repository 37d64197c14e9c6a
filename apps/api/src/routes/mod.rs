pub mod health;

use axum::{routing::get, Router};

use crate::state::AppState;
use crate::{admin, ai, auth, custom_resume, dashboard, elements, payments};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/auth", auth::router())
        .nest("/api/payment", payments::router())
        .nest("/api/ai", ai::router())
        .nest("/api/admin", admin::router())
        .merge(elements::router())
        .merge(custom_resume::router())
        .merge(dashboard::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        build_router(AppState::for_tests())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_element_routes_require_a_token() {
        for uri in ["/api/project/", "/api/project", "/api/custom-resume/", "/api/dashboard/"] {
            let response = app()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_garbage_bearer_is_rejected() {
        let response = app()
            .oneshot(
                Request::get("/api/auth/me")
                    .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_without_cookie_is_unauthorized() {
        let response = app()
            .oneshot(Request::post("/api/auth/refresh").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    async fn post_json(uri: &str, body: &'static str) -> (StatusCode, serde_json::Value) {
        let response = app()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_login_missing_password_is_json_422() {
        let (status, body) = post_json("/api/auth/login", r#"{"email":"a@b.co"}"#).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"][0], "body");
        assert_eq!(body["detail"][0]["loc"][1], "password");
        assert_eq!(body["detail"][0]["type"], "value_error");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400_with_detail() {
        let (status, body) = post_json("/api/auth/login", r#"{"email":"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Malformed JSON body");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app()
            .oneshot(Request::get("/api/nothing-here").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
