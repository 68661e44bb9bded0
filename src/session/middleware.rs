use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use super::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::shared::{AppError, AppState};

/// Tokens found on an incoming request
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    /// Reads the access token from the `accessToken` cookie, falling back to
    /// an `Authorization: Bearer` header, and the refresh token from its cookie.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let jar = CookieJar::from_headers(headers);

        let access_token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| bearer_token(headers));

        let refresh_token = jar
            .get(REFRESH_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|value| !value.is_empty());

        Self {
            access_token,
            refresh_token,
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Admin authentication middleware - verifies the access token against the
/// admin store and adds the `AuthenticatedAccount` to request extensions.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), session::admin_auth))
#[instrument(skip(state, req, next))]
pub async fn admin_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    info!(
        "Admin authentication middleware triggered for request {}",
        req.uri()
    );

    let credentials = Credentials::from_headers(req.headers());

    let authenticated = match state.admin_service.authenticate(&credentials).await {
        Ok(authenticated) => authenticated,
        Err(e) => {
            warn!("Admin authentication failed: {}", e);
            return Err(e);
        }
    };

    info!(
        account_id = %authenticated.claims.subject_id,
        role = %authenticated.claims.role,
        "Authentication successful, adding account to request"
    );

    req.extensions_mut().insert(authenticated);

    Ok(next.run(req).await)
}
