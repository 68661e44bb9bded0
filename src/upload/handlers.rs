use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::{info, instrument, warn};

use super::relay::UploadedImage;
use crate::shared::{ApiResponse, AppError, AppState};

const FILE_FIELD: &str = "file";

/// HTTP handler for uploading a house photo
///
/// POST /api/upload-photo/house
/// Multipart body with the image in the `file` field
#[instrument(name = "upload_house_photo", skip_all)]
pub async fn upload_house_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadedImage>>, AppError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Malformed multipart body");
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file bytes: {}", e)))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload
        .filter(|(_, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    info!(file_name = %file_name, size = bytes.len(), "Relaying house photo");
    let image = state
        .image_relay
        .relay(&file_name, &bytes, Some(&state.house_image_folder))
        .await?;

    Ok(Json(ApiResponse::success(
        "Image uploaded successfully",
        image,
    )))
}
