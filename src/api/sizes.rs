use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::error::ApiResult;
use super::include_deleted;
use super::products::DeletedQuery;
use crate::authz::Permission;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::catalog_service::{self, SizeInput, SizeUpdate};

#[utoipa::path(
    get,
    path = "/api/sizes",
    tag = "catalog",
    params(DeletedQuery),
    responses((status = 200, description = "Sizes ordered by sort_order"))
)]
pub async fn list_sizes(
    State(state): State<AppState>,
    claims: Option<Claims>,
    Query(query): Query<DeletedQuery>,
) -> ApiResult<impl IntoResponse> {
    let include_deleted = include_deleted(
        &state,
        claims.as_ref(),
        query.include_deleted,
        Permission::CatalogRestore,
    )
    .await?;
    let sizes = catalog_service::list_sizes(state.db(), include_deleted).await?;
    Ok(Json(json!({ "sizes": sizes, "total": sizes.len() })))
}

#[utoipa::path(
    post,
    path = "/api/sizes",
    tag = "catalog",
    responses(
        (status = 201, description = "Size created"),
        (status = 400, description = "Label is required"),
        (status = 409, description = "Label already taken")
    )
)]
pub async fn create_size(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<SizeInput>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsWrite).await?;
    let size =
        catalog_service::create_size(state.db(), &state.audit, &claims.actor(), payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "size": size }))))
}

#[utoipa::path(
    put,
    path = "/api/sizes/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Size id")),
    responses((status = 200, description = "Size updated"))
)]
pub async fn update_size(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<SizeUpdate>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsWrite).await?;
    let size =
        catalog_service::update_size(state.db(), &state.audit, &claims.actor(), id, payload)
            .await?;
    Ok(Json(json!({ "size": size })))
}

#[utoipa::path(
    delete,
    path = "/api/sizes/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Size id")),
    responses(
        (status = 200, description = "Size soft-deleted"),
        (status = 409, description = "Used by live variants")
    )
)]
pub async fn delete_size(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsDelete).await?;
    let size =
        catalog_service::delete_size(state.db(), &state.audit, &claims.actor(), id).await?;
    Ok(Json(json!({ "size": size })))
}

#[utoipa::path(
    post,
    path = "/api/sizes/{id}/restore",
    tag = "catalog",
    params(("id" = i32, Path, description = "Size id")),
    responses((status = 200, description = "Size restored"))
)]
pub async fn restore_size(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::CatalogRestore).await?;
    let size =
        catalog_service::restore_size(state.db(), &state.audit, &claims.actor(), id).await?;
    Ok(Json(json!({ "size": size })))
}
