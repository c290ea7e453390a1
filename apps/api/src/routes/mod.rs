pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::enhancement::handlers as enhancement;
use crate::resumes::{analytics, handlers as resumes};
use crate::state::AppState;
use crate::uploads::handlers::{self as uploads, UPLOAD_BODY_LIMIT};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/auth/registration/", post(auth::handle_register))
        .route("/auth/login/", post(auth::handle_login))
        .route("/auth/token/refresh/", post(auth::handle_refresh))
        .route("/auth/user/", get(auth::handle_me))
        // Resume builder
        .route(
            "/resumes/",
            get(resumes::handle_list).post(resumes::handle_create),
        )
        .route(
            "/resumes/:id/",
            get(resumes::handle_retrieve)
                .put(resumes::handle_update)
                .patch(resumes::handle_patch)
                .delete(resumes::handle_delete),
        )
        .route("/resumes/:id/export/", get(resumes::handle_export))
        .route("/enhance-text/", post(enhancement::handle_enhance_text))
        .route("/analytics/", get(analytics::handle_analytics))
        // Upload & analysis
        .route(
            "/upload/",
            post(uploads::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/status/:upload_id/", get(uploads::handle_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::tokens::{TokenService, TokenType};
    use crate::config::Config;
    use crate::state::testing::TestApp;

    async fn send(request: Request<Body>) -> Response {
        build_router(TestApp::new().state).oneshot(request).await.unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-api");
    }

    #[tokio::test]
    async fn test_protected_routes_require_a_bearer_token() {
        for (method, uri) in [
            ("GET", "/resumes/"),
            ("GET", "/analytics/"),
            ("GET", "/auth/user/"),
            ("POST", "/upload/"),
            ("GET", "/status/00000000-0000-0000-0000-000000000000/"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = send(request).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            let body = body_json(response).await;
            assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        }
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let tokens = TokenService::from_config(&Config::for_tests());
        let refresh = tokens.issue(Uuid::new_v4(), TokenType::Refresh).unwrap();

        let mut request = json_post("/enhance-text/", r#"{"text": "Wrote code"}"#);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {refresh}").parse().unwrap(),
        );
        assert_eq!(send(request).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_registration_validation_happens_before_persistence() {
        let response = send(json_post(
            "/auth/registration/",
            r#"{"username": "bad name!", "email": "nope", "password": "short"}"#,
        ))
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let fields = &body["error"]["fields"];
        assert!(fields["username"].is_array());
        assert!(fields["email"].is_array());
        assert!(fields["password"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_validation_error() {
        let response = send(json_post("/auth/login/", "{\"username\": ")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_routes_use_trailing_slashes() {
        let response = send(Request::get("/analytics").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
