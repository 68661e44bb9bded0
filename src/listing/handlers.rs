use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use super::{
    models::ListingModel,
    types::{ListingInput, ListingPage, ListingQuery},
};
use crate::shared::{ApiJson, ApiQuery, ApiResponse, AppError, AppState};

type ListingResponse = Json<ApiResponse<ListingModel>>;

/// HTTP handler for searching listings
///
/// GET /api/house
#[instrument(name = "list_houses", skip(state))]
pub async fn list_houses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListingQuery>,
) -> Result<Json<ApiResponse<ListingPage>>, AppError> {
    let page = state.listing_service.search_listings(query).await?;

    info!(total = page.total, page = page.page, "Houses fetched");
    Ok(Json(ApiResponse::success(
        "Houses fetched successfully",
        page,
    )))
}

/// HTTP handler for creating a listing
///
/// POST /api/house/create
/// Returns the stored listing, including its generated slug
#[instrument(name = "create_house", skip(state, input))]
pub async fn create_house(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ListingInput>,
) -> Result<(StatusCode, ListingResponse), AppError> {
    let listing = state.listing_service.create_listing(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "House details added successfully",
            listing,
        )),
    ))
}

/// GET /api/house/:id
#[instrument(name = "get_house", skip(state))]
pub async fn get_house(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ListingResponse, AppError> {
    let listing = state.listing_service.get_listing(&id).await?;
    Ok(Json(ApiResponse::success(
        "House fetched successfully",
        listing,
    )))
}

/// GET /api/house/single/:slug
#[instrument(name = "get_house_by_slug", skip(state))]
pub async fn get_house_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ListingResponse, AppError> {
    let listing = state.listing_service.get_listing_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(
        "House fetched successfully",
        listing,
    )))
}

/// PUT /api/house/:id
#[instrument(name = "update_house", skip(state, input))]
pub async fn update_house(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<ListingInput>,
) -> Result<ListingResponse, AppError> {
    let listing = state.listing_service.update_listing(&id, input).await?;
    Ok(Json(ApiResponse::success(
        "House updated successfully",
        listing,
    )))
}

/// DELETE /api/house/:id
#[instrument(name = "delete_house", skip(state))]
pub async fn delete_house(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ListingResponse, AppError> {
    let listing = state.listing_service.delete_listing(&id).await?;
    Ok(Json(ApiResponse::success(
        "House deleted successfully",
        listing,
    )))
}
