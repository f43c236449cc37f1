pub mod audit;
pub mod auth;
pub mod colors;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod products;
pub mod reservations;
pub mod roles;
pub mod sizes;
pub mod users;
pub mod variants;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::authz::Permission;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::Claims;
use error::ApiResult;

/// Soft-deleted rows are only listed for callers holding `permission`
pub(crate) async fn include_deleted(
    state: &AppState,
    claims: Option<&Claims>,
    requested: bool,
    permission: Permission,
) -> ApiResult<bool> {
    if !requested {
        return Ok(false);
    }
    let claims = claims.ok_or_else(|| {
        DomainError::Unauthorized("Authentication required to see deleted rows".to_string())
    })?;
    state.authorize(claims, permission).await?;
    Ok(true)
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        // Products
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/products/:id/restore", post(products::restore_product))
        .route(
            "/products/:id/variants",
            get(products::list_product_variants).post(products::create_variant),
        )
        // Variants
        .route(
            "/variants/:id",
            get(variants::get_variant)
                .put(variants::update_variant)
                .delete(variants::delete_variant),
        )
        .route("/variants/:id/restore", post(variants::restore_variant))
        .route("/variants/:id/stock", post(variants::adjust_stock))
        // Colors & sizes
        .route("/colors", get(colors::list_colors).post(colors::create_color))
        .route(
            "/colors/:id",
            put(colors::update_color).delete(colors::delete_color),
        )
        .route("/colors/:id/restore", post(colors::restore_color))
        .route("/sizes", get(sizes::list_sizes).post(sizes::create_size))
        .route(
            "/sizes/:id",
            put(sizes::update_size).delete(sizes::delete_size),
        )
        .route("/sizes/:id/restore", post(sizes::restore_size))
        // Reservations
        .route(
            "/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route("/reservations/:id", get(reservations::get_reservation))
        .route("/reservations/:id/status", put(reservations::update_status))
        .route(
            "/reservations/:id/cancel",
            post(reservations::cancel_reservation),
        )
        // Users & roles
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/restore", post(users::restore_user))
        .route("/roles", get(roles::list_roles))
        .route("/roles/:name/permissions", put(roles::replace_permissions))
        // Audit trail
        .route("/audit-logs", get(audit::list_audit_logs))
        .route(
            "/audit-logs/:entity_type/:entity_id",
            get(audit::entity_history),
        )
        // Dashboard
        .route("/dashboard/summary", get(dashboard::summary))
        .with_state(state)
}
