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
use crate::services::catalog_service::{self, ColorInput, ColorUpdate};

#[utoipa::path(
    get,
    path = "/api/colors",
    tag = "catalog",
    params(DeletedQuery),
    responses((status = 200, description = "Colors ordered by name"))
)]
pub async fn list_colors(
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
    let colors = catalog_service::list_colors(state.db(), include_deleted).await?;
    Ok(Json(json!({ "colors": colors, "total": colors.len() })))
}

#[utoipa::path(
    post,
    path = "/api/colors",
    tag = "catalog",
    responses(
        (status = 201, description = "Color created"),
        (status = 400, description = "Hex code is not #RRGGBB"),
        (status = 409, description = "Name already taken")
    )
)]
pub async fn create_color(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<ColorInput>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsWrite).await?;
    let color =
        catalog_service::create_color(state.db(), &state.audit, &claims.actor(), payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "color": color }))))
}

#[utoipa::path(
    put,
    path = "/api/colors/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Color id")),
    responses((status = 200, description = "Color updated"))
)]
pub async fn update_color(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<ColorUpdate>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsWrite).await?;
    let color =
        catalog_service::update_color(state.db(), &state.audit, &claims.actor(), id, payload)
            .await?;
    Ok(Json(json!({ "color": color })))
}

#[utoipa::path(
    delete,
    path = "/api/colors/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Color id")),
    responses(
        (status = 200, description = "Color soft-deleted"),
        (status = 409, description = "Used by live variants")
    )
)]
pub async fn delete_color(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsDelete).await?;
    let color =
        catalog_service::delete_color(state.db(), &state.audit, &claims.actor(), id).await?;
    Ok(Json(json!({ "color": color })))
}

#[utoipa::path(
    post,
    path = "/api/colors/{id}/restore",
    tag = "catalog",
    params(("id" = i32, Path, description = "Color id")),
    responses((status = 200, description = "Color restored"))
)]
pub async fn restore_color(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::CatalogRestore).await?;
    let color =
        catalog_service::restore_color(state.db(), &state.audit, &claims.actor(), id).await?;
    Ok(Json(json!({ "color": color })))
}
