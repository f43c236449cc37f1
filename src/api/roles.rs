use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::error::ApiResult;
use crate::authz::Permission;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::role_service;

#[derive(Debug, Deserialize)]
pub struct PermissionsRequest {
    pub permissions: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "users",
    responses((status = 200, description = "Roles with rank and effective permissions"))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    claims: Claims,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::UsersRead).await?;
    let table = state.permission_table().await;
    let roles = role_service::list_roles(state.db(), &table).await?;
    Ok(Json(json!({ "roles": roles })))
}

#[utoipa::path(
    put,
    path = "/api/roles/{name}/permissions",
    tag = "users",
    params(("name" = String, Path, description = "Role name")),
    responses(
        (status = 200, description = "Grants replaced"),
        (status = 400, description = "Unknown permission code or admin role"),
        (status = 404, description = "Unknown role")
    )
)]
pub async fn replace_permissions(
    State(state): State<AppState>,
    claims: Claims,
    Path(name): Path<String>,
    Json(payload): Json<PermissionsRequest>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::RolesManage).await?;
    let permissions = role_service::replace_role_permissions(
        state.db(),
        &state.audit,
        &claims.actor(),
        &name,
        &payload.permissions,
    )
    .await?;
    state.reload_permissions().await?;

    Ok(Json(json!({ "role": name, "permissions": permissions })))
}
