use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::account::{AccountService, AdminAccount, UserAccount};
use crate::listing::service::ListingService;
use crate::session::TokenConfig;
use crate::upload::ImageRelay;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<AccountService<UserAccount>>,
    pub admin_service: Arc<AccountService<AdminAccount>>,
    pub listing_service: Arc<ListingService>,
    pub image_relay: Arc<ImageRelay>,
    pub token_config: TokenConfig,
    pub house_image_folder: String,
}

impl AppState {
    pub fn new(
        user_service: Arc<AccountService<UserAccount>>,
        admin_service: Arc<AccountService<AdminAccount>>,
        listing_service: Arc<ListingService>,
        image_relay: Arc<ImageRelay>,
        token_config: TokenConfig,
        house_image_folder: String,
    ) -> Self {
        Self {
            user_service,
            admin_service,
            listing_service,
            image_relay,
            token_config,
            house_image_folder,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No token provided")]
    NoToken,

    #[error("Access token missing or expired")]
    TokenExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::JwtError(_)
            | AppError::Unauthorized(_)
            | AppError::NoToken
            | AppError::TokenExpired => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::UploadFailed(_) | AppError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable code for clients that need to branch on auth state
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            AppError::NoToken => Some("NO_TOKEN"),
            AppError::TokenExpired => Some("TOKEN_EXPIRED"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().map(str::to_string);

        let (message, errors) = match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg) => (msg, None),
            // Never tell the client which verification step failed
            AppError::JwtError(_) | AppError::TokenExpired => {
                ("Invalid or expired token".to_string(), None)
            }
            AppError::NoToken => ("No token, access denied".to_string(), None),
            AppError::Validation(errors) => ("Validation failed".to_string(), Some(errors)),
            AppError::DatabaseError(msg) => {
                warn!(error = %msg, "Responding with database error");
                ("Internal server error".to_string(), None)
            }
            AppError::UploadFailed(msg) => {
                warn!(error = %msg, "Responding with upload error");
                ("Image upload failed".to_string(), None)
            }
            AppError::Internal => ("Internal server error".to_string(), None),
        };

        let body = ApiResponse::<()> {
            success: false,
            message,
            data: None,
            errors,
            error_code,
        };

        (status, Json(body)).into_response()
    }
}

/// Response envelope shared by every endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
            error_code: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: None,
            error_code: None,
        }
    }
}

/// `Json` extractor whose rejection renders through `AppError`
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                warn!(error = %rejection.body_text(), "Rejected request body");
                AppError::BadRequest(rejection.body_text())
            })?;
        Ok(ApiJson(value))
    }
}

/// `Query` extractor whose rejection renders through `AppError`
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                warn!(error = %rejection.body_text(), "Rejected query string");
                AppError::BadRequest(rejection.body_text())
            })?;
        Ok(ApiQuery(value))
    }
}

/// Generates an ObjectId-compatible identifier: 4-byte big-endian timestamp
/// followed by 8 random bytes, hex encoded
pub fn new_object_id() -> String {
    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&(Utc::now().timestamp() as u32).to_be_bytes());
    bytes[4..].copy_from_slice(&rand::random::<[u8; 8]>());
    hex::encode(bytes)
}

/// Checks that an identifier is 24 hex characters
pub fn is_valid_object_id(id: &str) -> bool {
    id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit())
}
