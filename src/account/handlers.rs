use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument};

use super::{
    models::AccountKind,
    service::AccountService,
    types::{AccountProfile, AuthenticatedAccount, CreateAdminRequest, LoginRequest, RegisterRequest},
};
use crate::session::{clear_token_pair, set_token_pair, Credentials};
use crate::shared::{ApiJson, ApiResponse, AppError, AppState};

type ProfileResponse = Json<ApiResponse<AccountProfile>>;

async fn login<K: AccountKind>(
    service: &AccountService<K>,
    jar: CookieJar,
    request: LoginRequest,
) -> Result<(CookieJar, ProfileResponse), AppError> {
    let (profile, tokens) = service.login(request).await?;
    let jar = set_token_pair(jar, tokens, service.token_config());

    Ok((jar, Json(ApiResponse::success("Login successful", profile))))
}

async fn refresh<K: AccountKind>(
    service: &AccountService<K>,
    headers: &HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<()>>), AppError> {
    let credentials = Credentials::from_headers(headers);
    let (account, tokens) = service.refresh(&credentials).await?;
    let jar = set_token_pair(jar, tokens, service.token_config());

    info!(account_id = %account.id, "Refresh cookies reset");
    Ok((jar, Json(ApiResponse::message("Token refreshed successfully"))))
}

async fn details<K: AccountKind>(
    service: &AccountService<K>,
    headers: &HeaderMap,
) -> Result<ProfileResponse, AppError> {
    let profile = service.profile(&Credentials::from_headers(headers)).await?;
    Ok(Json(ApiResponse::success(
        "Auth details fetched successfully",
        profile,
    )))
}

fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    (
        clear_token_pair(jar),
        Json(ApiResponse::message("Logged out successfully")),
    )
}

/// POST /api/user/register
#[instrument(name = "user_register", skip(state, request))]
pub async fn user_register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, ProfileResponse), AppError> {
    let profile = state.user_service.register(request).await?;

    info!(account_id = %profile.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Registered successfully", profile)),
    ))
}

/// POST /api/user/login
#[instrument(name = "user_login", skip_all)]
pub async fn user_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, ProfileResponse), AppError> {
    login(state.user_service.as_ref(), jar, request).await
}

/// POST /api/user/refresh-token
#[instrument(name = "user_refresh", skip_all)]
pub async fn user_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<()>>), AppError> {
    refresh(state.user_service.as_ref(), &headers, jar).await
}

/// GET /api/user/profile and /api/user/auth-details
#[instrument(name = "user_profile", skip_all)]
pub async fn user_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ProfileResponse, AppError> {
    details(state.user_service.as_ref(), &headers).await
}

/// POST /api/user/logout
pub async fn user_logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    logout(jar)
}

/// POST /api/admin/login
#[instrument(name = "admin_login", skip_all)]
pub async fn admin_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, ProfileResponse), AppError> {
    login(state.admin_service.as_ref(), jar, request).await
}

/// POST /api/admin/refresh-token
#[instrument(name = "admin_refresh", skip_all)]
pub async fn admin_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<()>>), AppError> {
    refresh(state.admin_service.as_ref(), &headers, jar).await
}

/// GET /api/admin/auth-details
#[instrument(name = "admin_auth_details", skip_all)]
pub async fn admin_auth_details(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ProfileResponse, AppError> {
    details(state.admin_service.as_ref(), &headers).await
}

/// POST /api/admin/logout
pub async fn admin_logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<()>>) {
    logout(jar)
}

/// POST /api/admin/create-admin
///
/// Runs behind `session::admin_auth`, which supplies the caller.
#[instrument(name = "create_admin", skip_all, fields(caller_id = %caller.account.id))]
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedAccount>,
    ApiJson(request): ApiJson<CreateAdminRequest>,
) -> Result<(StatusCode, ProfileResponse), AppError> {
    let profile = state.admin_service.create_admin(&caller, request).await?;

    info!(account_id = %profile.id, role = ?profile.role, "Admin created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Admin created successfully", profile)),
    ))
}
