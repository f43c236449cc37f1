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
use crate::domain::PageRequest;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::user_service::{self, CreateUserInput, UpdateUserInput, UserFilter};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    pub role: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// Requires users:manage
    #[serde(default)]
    pub include_deleted: bool,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(UserQuery),
    responses(
        (status = 200, description = "One page of users"),
        (status = 403, description = "Missing users:read")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<UserQuery>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::UsersRead).await?;
    let include_deleted = include_deleted(
        &state,
        Some(&claims),
        query.include_deleted,
        Permission::UsersManage,
    )
    .await?;

    let result = user_service::list_users(
        state.db(),
        UserFilter {
            include_deleted,
            role: query.role,
            page: PageRequest::new(query.page, query.limit),
        },
    )
    .await?;

    Ok(Json(json!({
        "users": result.items,
        "total": result.total,
        "page": result.page,
        "limit": result.limit,
    })))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User"),
        (status = 403, description = "Not self and missing users:read")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    if claims.user_id()? != id {
        state.authorize(&claims, Permission::UsersRead).await?;
    }
    let include_deleted = state.allows(&claims, Permission::UsersManage).await;
    let user = user_service::get_user(state.db(), id, include_deleted).await?;
    Ok(Json(json!({ "user": user })))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 201, description = "User created"),
        (status = 403, description = "Role not assignable by caller"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CreateUserInput>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::UsersManage).await?;
    let user = user_service::create_user(state.db(), &state.audit, &claims, payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User updated"),
        (status = 403, description = "Target outranks caller or role not assignable")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserInput>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::UsersManage).await?;
    let user = user_service::update_user(state.db(), &state.audit, &claims, id, payload).await?;
    Ok(Json(json!({ "user": user })))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User soft-deleted and signed out"),
        (status = 403, description = "Self-deletion or target outranks caller")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::UsersManage).await?;
    let user = user_service::delete_user(state.db(), &state.audit, &claims, id).await?;
    Ok(Json(json!({ "user": user })))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/restore",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User restored"),
        (status = 409, description = "User is not deleted")
    )
)]
pub async fn restore_user(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::UsersManage).await?;
    let user = user_service::restore_user(state.db(), &state.audit, &claims, id).await?;
    Ok(Json(json!({ "user": user })))
}
