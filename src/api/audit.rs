use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use super::error::ApiResult;
use crate::authz::Permission;
use crate::domain::PageRequest;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::audit_service::{self, AuditFilter};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// e.g. product, product_variant, user
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    /// User who made the change
    pub actor_id: Option<i32>,
    /// create, update, delete, restore or an event name
    pub action: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/api/audit-logs",
    tag = "audit",
    params(AuditQuery),
    responses((status = 200, description = "Audit entries, newest first"))
)]
pub async fn list_audit_logs(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<AuditQuery>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::AuditRead).await?;
    let result = audit_service::list_audit_logs(
        state.db(),
        AuditFilter {
            entity_type: query.entity_type,
            entity_id: query.entity_id,
            actor_id: query.actor_id,
            action: query.action,
            page: PageRequest::new(query.page, query.limit),
        },
    )
    .await?;

    Ok(Json(json!({
        "entries": result.items,
        "total": result.total,
        "page": result.page,
        "limit": result.limit,
        "pending": state.audit.pending(),
    })))
}

#[utoipa::path(
    get,
    path = "/api/audit-logs/{entity_type}/{entity_id}",
    tag = "audit",
    params(
        ("entity_type" = String, Path, description = "Entity type"),
        ("entity_id" = String, Path, description = "Entity id")
    ),
    responses((status = 200, description = "History of one entity, oldest first"))
)]
pub async fn entity_history(
    State(state): State<AppState>,
    claims: Claims,
    Path((entity_type, entity_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::AuditRead).await?;
    let entries = audit_service::entity_history(state.db(), &entity_type, &entity_id).await?;
    Ok(Json(json!({ "entries": entries, "total": entries.len() })))
}
