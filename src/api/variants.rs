use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use super::error::ApiResult;
use super::include_deleted;
use super::products::DeletedQuery;
use crate::authz::Permission;
use crate::domain::{DomainError, StockAdjustment, VariantUpdate};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;

#[utoipa::path(
    get,
    path = "/api/variants/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Variant id"), DeletedQuery),
    responses(
        (status = 200, description = "Variant"),
        (status = 404, description = "Missing or deleted")
    )
)]
pub async fn get_variant(
    State(state): State<AppState>,
    claims: Option<Claims>,
    Path(id): Path<i32>,
    Query(query): Query<DeletedQuery>,
) -> ApiResult<impl IntoResponse> {
    let include_deleted = include_deleted(
        &state,
        claims.as_ref(),
        query.include_deleted,
        Permission::CatalogRestore,
    )
    .await?;

    match state.variant_repo.find_by_id(id, include_deleted).await? {
        Some(variant) => Ok(Json(json!({ "variant": variant }))),
        None => Err(DomainError::not_found("Variant")),
    }
}

#[utoipa::path(
    put,
    path = "/api/variants/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Variant updated"),
        (status = 409, description = "Combination or sku already taken")
    )
)]
pub async fn update_variant(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<VariantUpdate>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsWrite).await?;
    let variant = state
        .variant_repo
        .update(&claims.actor(), id, payload)
        .await?;
    Ok(Json(json!({ "variant": variant })))
}

#[utoipa::path(
    delete,
    path = "/api/variants/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Variant soft-deleted"),
        (status = 409, description = "Active reservations exist")
    )
)]
pub async fn delete_variant(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsDelete).await?;
    let variant = state.variant_repo.soft_delete(&claims.actor(), id).await?;
    Ok(Json(json!({ "variant": variant })))
}

#[utoipa::path(
    post,
    path = "/api/variants/{id}/restore",
    tag = "catalog",
    params(("id" = i32, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Variant restored"),
        (status = 409, description = "Not deleted, product deleted, or combination taken")
    )
)]
pub async fn restore_variant(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::CatalogRestore).await?;
    let variant = state.variant_repo.restore(&claims.actor(), id).await?;
    Ok(Json(json!({ "variant": variant })))
}

#[utoipa::path(
    post,
    path = "/api/variants/{id}/stock",
    tag = "catalog",
    params(("id" = i32, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Stock adjusted"),
        (status = 409, description = "Stock would go below zero")
    )
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<StockAdjustment>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::InventoryWrite).await?;
    let variant = state
        .variant_repo
        .adjust_stock(&claims.actor(), id, payload)
        .await?;
    Ok(Json(json!({ "variant": variant })))
}
