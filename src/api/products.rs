//! Product API handlers using repository pattern

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use super::error::ApiResult;
use super::include_deleted;
use crate::authz::Permission;
use crate::domain::{
    DomainError, PageRequest, ProductFilter, ProductInput, ProductUpdate, VariantInput,
};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Substring of name or sku
    pub q: Option<String>,
    pub category: Option<String>,
    /// 1-based page
    pub page: Option<u64>,
    /// Page size, max 100
    pub limit: Option<u64>,
    /// Requires catalog:restore
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeletedQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "catalog",
    params(ProductQuery),
    responses(
        (status = 200, description = "One page of products")
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    claims: Option<Claims>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<impl IntoResponse> {
    let include_deleted = include_deleted(
        &state,
        claims.as_ref(),
        query.include_deleted,
        Permission::CatalogRestore,
    )
    .await?;

    let result = state
        .product_repo
        .find_all(ProductFilter {
            query: query.q,
            category: query.category,
            include_deleted,
            page: PageRequest::new(query.page, query.limit),
        })
        .await?;

    Ok(Json(json!({
        "products": result.items,
        "total": result.total,
        "page": result.page,
        "limit": result.limit,
    })))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Product id"), DeletedQuery),
    responses(
        (status = 200, description = "Product with its live variants"),
        (status = 404, description = "Missing or deleted")
    )
)]
pub async fn get_product(
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

    match state.product_repo.find_by_id(id, include_deleted).await? {
        Some(product) => Ok(Json(json!({ "product": product }))),
        None => Err(DomainError::not_found("Product")),
    }
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "catalog",
    responses(
        (status = 201, description = "Product created"),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Missing products:write")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<ProductInput>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsWrite).await?;
    let product = state.product_repo.create(&claims.actor(), payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "product": product }))))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Missing or deleted")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<ProductUpdate>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsWrite).await?;
    let product = state
        .product_repo
        .update(&claims.actor(), id, payload)
        .await?;
    Ok(Json(json!({ "product": product })))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product and its variants soft-deleted"),
        (status = 409, description = "Active reservations exist")
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsDelete).await?;
    let outcome = state.product_repo.soft_delete(&claims.actor(), id).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/restore",
    tag = "catalog",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product and its cascaded variants restored"),
        (status = 409, description = "Product is not deleted")
    )
)]
pub async fn restore_product(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::CatalogRestore).await?;
    let outcome = state.product_repo.restore(&claims.actor(), id).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/variants",
    tag = "catalog",
    params(("id" = i32, Path, description = "Product id"), DeletedQuery),
    responses(
        (status = 200, description = "Variants of the product")
    )
)]
pub async fn list_product_variants(
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

    let variants = state
        .variant_repo
        .find_by_product(id, include_deleted)
        .await?;
    Ok(Json(json!({ "variants": variants, "total": variants.len() })))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/variants",
    tag = "catalog",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 201, description = "Variant created"),
        (status = 400, description = "Unknown color/size or invalid price/stock"),
        (status = 409, description = "Combination or sku already taken")
    )
)]
pub async fn create_variant(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<VariantInput>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::ProductsWrite).await?;
    let variant = state
        .variant_repo
        .create(&claims.actor(), id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "variant": variant }))))
}
