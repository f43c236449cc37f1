use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::auth::register,
        api::auth::login,
        api::auth::refresh,
        api::auth::logout,
        api::auth::me,
        api::auth::change_password,
        api::products::list_products,
        api::products::get_product,
        api::products::create_product,
        api::products::update_product,
        api::products::delete_product,
        api::products::restore_product,
        api::products::list_product_variants,
        api::products::create_variant,
        api::variants::get_variant,
        api::variants::update_variant,
        api::variants::delete_variant,
        api::variants::restore_variant,
        api::variants::adjust_stock,
        api::colors::list_colors,
        api::colors::create_color,
        api::colors::update_color,
        api::colors::delete_color,
        api::colors::restore_color,
        api::sizes::list_sizes,
        api::sizes::create_size,
        api::sizes::update_size,
        api::sizes::delete_size,
        api::sizes::restore_size,
        api::reservations::create_reservation,
        api::reservations::list_reservations,
        api::reservations::get_reservation,
        api::reservations::update_status,
        api::reservations::cancel_reservation,
        api::users::list_users,
        api::users::get_user,
        api::users::create_user,
        api::users::update_user,
        api::users::delete_user,
        api::users::restore_user,
        api::roles::list_roles,
        api::roles::replace_permissions,
        api::audit::list_audit_logs,
        api::audit::entity_history,
        api::dashboard::summary,
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Sessions and tokens"),
        (name = "catalog", description = "Products, variants, colors and sizes"),
        (name = "reservations", description = "Stock reservations"),
        (name = "users", description = "Accounts, roles and permissions"),
        (name = "audit", description = "Audit trail"),
        (name = "dashboard", description = "Admin dashboard data")
    )
)]
pub struct ApiDoc;
