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
use crate::authz::Permission;
use crate::domain::{DomainError, PageRequest};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use crate::models::ReservationStatus;
use crate::services::reservation_service::{
    self, CreateReservationInput, ReservationFilter,
};

#[derive(Debug, Deserialize, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReservationQuery {
    /// pending, confirmed, completed or cancelled
    pub status: Option<String>,
    /// Owner filter, honoured with reservations:read_all
    pub user_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

fn parse_status(status: &str) -> Result<ReservationStatus, DomainError> {
    status.parse().map_err(DomainError::Validation)
}

/// Owner scope for callers without `reservations:read_all`
async fn owner_scope(state: &AppState, claims: &Claims) -> ApiResult<Option<i32>> {
    if state.allows(claims, Permission::ReservationsReadAll).await {
        Ok(None)
    } else {
        Ok(Some(claims.user_id()?))
    }
}

#[utoipa::path(
    post,
    path = "/api/reservations",
    tag = "reservations",
    responses(
        (status = 201, description = "Pending reservation created"),
        (status = 404, description = "Variant or product missing"),
        (status = 409, description = "Insufficient stock")
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<CreateReservationInput>,
) -> ApiResult<impl IntoResponse> {
    state
        .authorize(&claims, Permission::ReservationsCreate)
        .await?;
    let can_manage = state.allows(&claims, Permission::ReservationsManage).await;

    let reservation = reservation_service::create_reservation(
        state.db(),
        &state.audit,
        &claims,
        can_manage,
        payload,
    )
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "reservation": reservation })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/reservations",
    tag = "reservations",
    params(ReservationQuery),
    responses(
        (status = 200, description = "Own reservations, or all with reservations:read_all")
    )
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<ReservationQuery>,
) -> ApiResult<impl IntoResponse> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let scope = owner_scope(&state, &claims).await?;

    let result = reservation_service::list_reservations(
        state.db(),
        ReservationFilter {
            status,
            user_id: query.user_id,
            variant_id: query.variant_id,
            page: PageRequest::new(query.page, query.limit),
        },
        scope,
    )
    .await?;

    Ok(Json(json!({
        "reservations": result.items,
        "total": result.total,
        "page": result.page,
        "limit": result.limit,
    })))
}

#[utoipa::path(
    get,
    path = "/api/reservations/{id}",
    tag = "reservations",
    params(("id" = i32, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation"),
        (status = 404, description = "Missing or owned by someone else")
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    let scope = owner_scope(&state, &claims).await?;
    let reservation = reservation_service::get_reservation(state.db(), id, scope).await?;
    Ok(Json(json!({ "reservation": reservation })))
}

async fn apply_transition(
    state: &AppState,
    claims: &Claims,
    id: i32,
    next: ReservationStatus,
) -> ApiResult<Json<serde_json::Value>> {
    let can_manage = state.allows(claims, Permission::ReservationsManage).await;
    let can_read_all = state.allows(claims, Permission::ReservationsReadAll).await;

    let reservation = reservation_service::transition(
        state.db(),
        &state.audit,
        claims,
        can_manage,
        can_read_all,
        id,
        next,
    )
    .await?;
    Ok(Json(json!({ "reservation": reservation })))
}

#[utoipa::path(
    put,
    path = "/api/reservations/{id}/status",
    tag = "reservations",
    params(("id" = i32, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Status changed"),
        (status = 403, description = "Transition requires reservations:manage"),
        (status = 409, description = "Transition not allowed or insufficient stock")
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<StatusRequest>,
) -> ApiResult<impl IntoResponse> {
    let next = parse_status(&payload.status)?;
    apply_transition(&state, &claims, id, next).await
}

#[utoipa::path(
    post,
    path = "/api/reservations/{id}/cancel",
    tag = "reservations",
    params(("id" = i32, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation cancelled"),
        (status = 409, description = "Already completed or cancelled")
    )
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    apply_transition(&state, &claims, id, ReservationStatus::Cancelled).await
}
