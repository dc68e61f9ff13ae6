//! Handlers for the `/properties` resource.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use campos_core::types::DbId;

use crate::error::AppResult;
use crate::multipart::read_property_form;
use crate::query::ListPropertiesParams;
use crate::response::{PropertyListResponse, PropertyResponse};
use crate::state::AppState;

/// GET /api/properties
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListPropertiesParams>,
) -> AppResult<Json<PropertyListResponse>> {
    let filter = params.filter()?;
    let page = state.service.list(&filter, params.page_request()).await?;
    Ok(Json(page.into()))
}

/// GET /api/properties/{id_or_slug}
pub async fn get_by_id_or_slug(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> AppResult<Json<PropertyResponse>> {
    let property = state.service.get(&id_or_slug).await?;
    Ok(Json(property.into()))
}

/// POST /api/properties
///
/// Multipart form: property fields plus up to 15 `images` files.
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<PropertyResponse>)> {
    let (form, files) = read_property_form(multipart).await?;
    let property = state.service.create(&form, &files).await?;
    Ok((StatusCode::CREATED, Json(property.into())))
}

/// PUT /api/properties/{id}
///
/// Multipart form: fields to change, an optional `keepImages` list and new
/// `images` files.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<PropertyResponse>> {
    let (form, files) = read_property_form(multipart).await?;
    let property = state.service.update(id, &form, &files).await?;
    Ok(Json(property.into()))
}

/// DELETE /api/properties/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    state.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
