use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use serde_json::json;

use super::error::ApiResult;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::{
    ACCESS_COOKIE, Claims, JwtKeys, REFRESH_COOKIE, REFRESH_COOKIE_PATH, build_cookie,
    cookie_value,
};
use crate::services::auth_service::{self, RegisterInput, TokenPair};

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email
    login: String,
    password: String,
}

#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

fn session_cookies(keys: &JwtKeys, pair: &TokenPair) -> [(header::HeaderName, String); 2] {
    [
        (
            header::SET_COOKIE,
            build_cookie(
                ACCESS_COOKIE,
                &pair.access_token,
                "/",
                keys.access_ttl().num_seconds(),
                keys.cookie_secure(),
            ),
        ),
        (
            header::SET_COOKIE,
            build_cookie(
                REFRESH_COOKIE,
                &pair.refresh_token,
                REFRESH_COOKIE_PATH,
                keys.refresh_ttl().num_seconds(),
                keys.cookie_secure(),
            ),
        ),
    ]
}

fn cleared_cookies(keys: &JwtKeys) -> [(header::HeaderName, String); 2] {
    [
        (
            header::SET_COOKIE,
            build_cookie(ACCESS_COOKIE, "", "/", 0, keys.cookie_secure()),
        ),
        (
            header::SET_COOKIE,
            build_cookie(REFRESH_COOKIE, "", REFRESH_COOKIE_PATH, 0, keys.cookie_secure()),
        ),
    ]
}

/// Refresh token from a JSON body, falling back to the cookie
fn presented_refresh_token(headers: &HeaderMap, body: &Bytes) -> Result<Option<String>, DomainError> {
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(body)
            .map_err(|e| DomainError::Validation(format!("Invalid request body: {}", e)))?
            .refresh_token
            .filter(|t| !t.is_empty())
    };
    Ok(from_body.or_else(|| cookie_value(headers, REFRESH_COOKIE)))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid username, email or password"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterInput>,
) -> ApiResult<impl IntoResponse> {
    let user = auth_service::register(state.db(), &state.audit, payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    responses(
        (status = 200, description = "Token pair issued, session cookies set"),
        (status = 401, description = "Invalid credentials or disabled account")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    tracing::info!("Login attempt for: {}", payload.login);
    let pair = auth_service::login(
        state.db(),
        &state.audit,
        &state.keys,
        &payload.login,
        &payload.password,
    )
    .await?;

    Ok((AppendHeaders(session_cookies(&state.keys, &pair)), Json(pair)))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "Rotated token pair"),
        (status = 401, description = "Unknown, expired or reused refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let token = presented_refresh_token(&headers, &body)?
        .ok_or_else(|| DomainError::Unauthorized("Missing refresh token".to_string()))?;

    let pair = auth_service::refresh(state.db(), &state.audit, &state.keys, &token).await?;
    Ok((AppendHeaders(session_cookies(&state.keys, &pair)), Json(pair)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Refresh token revoked and cookies cleared")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let token = presented_refresh_token(&headers, &body)?;
    auth_service::logout(state.db(), token.as_deref()).await?;

    Ok((
        AppendHeaders(cleared_cookies(&state.keys)),
        Json(json!({ "message": "Logged out" })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(State(state): State<AppState>, claims: Claims) -> ApiResult<impl IntoResponse> {
    let user = auth_service::current_user(state.db(), claims.user_id()?).await?;
    let permissions = state.permission_table().await.permissions_for(&user.role);
    Ok(Json(json!({ "user": user, "permissions": permissions })))
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "auth",
    responses(
        (status = 200, description = "Password changed, other sessions revoked"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password is incorrect")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    auth_service::change_password(
        state.db(),
        &state.audit,
        claims.user_id()?,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;

    Ok((
        AppendHeaders(cleared_cookies(&state.keys)),
        Json(json!({ "message": "Password changed" })),
    ))
}
