use axum::Json;
use axum::extract::State;
use sea_orm::ConnectionTrait;
use serde_json::{Value, json};

use crate::infrastructure::AppState;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match state
        .db()
        .execute_unprepared("SELECT 1")
        .await
    {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!("Health check database ping failed: {}", e);
            "unavailable"
        }
    };

    Json(json!({
        "status": "ok",
        "service": "stockroom",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "audit_pending": state.audit.pending(),
    }))
}
