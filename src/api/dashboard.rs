use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::error::ApiResult;
use crate::authz::Permission;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::services::dashboard_service::{self, DEFAULT_LOW_STOCK_THRESHOLD};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Defaults to 5
    pub low_stock_threshold: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "dashboard",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Inventory and reservation counters"),
        (status = 403, description = "Missing dashboard:read")
    )
)]
pub async fn summary(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<impl IntoResponse> {
    state.authorize(&claims, Permission::DashboardRead).await?;
    let threshold = query
        .low_stock_threshold
        .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
    if threshold < 0 {
        return Err(DomainError::Validation(
            "low_stock_threshold must not be negative".to_string(),
        ));
    }
    Ok(Json(dashboard_service::summary(state.db(), threshold).await?))
}
