use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::account::{
    admin_auth_details, admin_login, admin_logout, admin_refresh, create_admin, user_login,
    user_logout, user_profile, user_refresh, user_register,
};
use crate::listing::{
    create_house, delete_house, get_house, get_house_by_slug, list_houses, update_house,
};
use crate::session::admin_auth;
use crate::shared::{ApiResponse, AppState};
use crate::upload::upload_house_photo;

pub const UPLOAD_BODY_LIMIT: usize = 30 * 1024 * 1024;

pub async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Server is healthy"))
}

/// Credentialed CORS; mirrors the caller's origin when none is configured
pub fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let origin = match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            warn!(error = %e, "Invalid CORS origin, mirroring request origin instead");
            AllowOrigin::mirror_request()
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(user_register))
        .route("/login", post(user_login))
        .route("/refresh-token", post(user_refresh))
        .route("/profile", get(user_profile))
        .route("/auth-details", get(user_profile))
        .route("/logout", post(user_logout))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/create-admin", post(create_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    Router::new()
        .route("/login", post(admin_login))
        .route("/refresh-token", post(admin_refresh))
        .route("/auth-details", get(admin_auth_details))
        .route("/logout", post(admin_logout))
        .merge(protected)
}

fn house_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_houses))
        .route("/create", post(create_house))
        .route("/single/:slug", get(get_house_by_slug))
        .route(
            "/:id",
            get(get_house).put(update_house).delete(delete_house),
        )
}

fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/house", post(upload_house_photo))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Full application router
pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/user", user_routes())
        .nest("/api/admin", admin_routes(&state))
        .nest("/api/house", house_routes())
        .nest("/api/upload-photo", upload_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt; // for `oneshot`

    fn test_app(origin: Option<&str>) -> Router {
        app(AppStateBuilder::new().build(), cors_layer(origin))
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], true);
    }

    #[tokio::test]
    async fn test_house_root_is_routed() {
        let response = test_app(None)
            .oneshot(Request::get("/api/house").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_admin_requires_token() {
        let response = test_app(None)
            .oneshot(
                Request::post("/api/admin/create-admin")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_auth_details_alias() {
        let response = test_app(None)
            .oneshot(
                Request::get("/api/user/auth-details")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_cors_mirrors_origin_with_credentials() {
        let response = test_app(None)
            .oneshot(
                Request::get("/health")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"],
            "http://localhost:3000"
        );
        assert_eq!(headers["access-control-allow-credentials"], "true");
    }

    #[tokio::test]
    async fn test_cors_configured_origin() {
        let response = test_app(Some("https://rentals.example"))
            .oneshot(
                Request::get("/health")
                    .header("origin", "https://rentals.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "https://rentals.example"
        );
    }
}
