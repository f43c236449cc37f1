//! Reservation Service
//!
//! Stock is checked when a reservation is created and only moves on status
//! transitions: confirming takes units out, cancelling a confirmed
//! reservation puts them back. Both happen in the same transaction as the
//! status change.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::audit::AuditLogger;
use crate::domain::{DomainError, PageRequest, Paginated, round_money};
use crate::infrastructure::auth::Claims;
use crate::infrastructure::db::now;
use crate::infrastructure::repositories::move_stock;
use crate::infrastructure::soft_delete::SoftDeletable;
use crate::models::reservation::{self, Entity as Reservation};
use crate::models::{ReservationStatus, product, product_variant, user};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReservationInput {
    pub variant_id: i32,
    pub quantity: i32,
    pub notes: Option<String>,
    /// Reserve on behalf of another user (staff only)
    pub user_id: Option<i32>,
}

#[derive(Debug, Default, Clone)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub user_id: Option<i32>,
    pub variant_id: Option<i32>,
    pub page: PageRequest,
}

/// Reservation with display names resolved
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: reservation::Model,
    pub username: Option<String>,
    pub variant_sku: Option<String>,
    pub product_name: Option<String>,
}

async fn views(
    db: &DatabaseConnection,
    reservations: Vec<reservation::Model>,
) -> Result<Vec<ReservationView>, DomainError> {
    let user_ids: Vec<i32> = reservations.iter().map(|r| r.user_id).collect();
    let variant_ids: Vec<i32> = reservations.iter().map(|r| r.variant_id).collect();

    let users: HashMap<i32, String> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let variants: HashMap<i32, product_variant::Model> = product_variant::Entity::find()
        .filter(product_variant::Column::Id.is_in(variant_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let product_ids: Vec<i32> = variants.values().map(|v| v.product_id).collect();
    let products: HashMap<i32, String> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    Ok(reservations
        .into_iter()
        .map(|r| {
            let variant = variants.get(&r.variant_id);
            ReservationView {
                username: users.get(&r.user_id).cloned(),
                variant_sku: variant.map(|v| v.sku.clone()),
                product_name: variant.and_then(|v| products.get(&v.product_id).cloned()),
                reservation: r,
            }
        })
        .collect())
}

async fn view(
    db: &DatabaseConnection,
    model: reservation::Model,
) -> Result<ReservationView, DomainError> {
    views(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| DomainError::Internal("Reservation view missing".to_string()))
}

pub async fn create_reservation(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Claims,
    can_manage: bool,
    input: CreateReservationInput,
) -> Result<ReservationView, DomainError> {
    if input.quantity < 1 {
        return Err(DomainError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }

    let actor_id = actor.user_id()?;
    let owner_id = input.user_id.unwrap_or(actor_id);
    if owner_id != actor_id && !can_manage {
        return Err(DomainError::Forbidden(
            "Cannot reserve on behalf of another user".to_string(),
        ));
    }

    let owner = user::Entity::find_live()
        .filter(user::Column::Id.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;
    if !owner.is_active {
        return Err(DomainError::Validation("User is not active".to_string()));
    }

    let variant = product_variant::Entity::find_live()
        .filter(product_variant::Column::Id.eq(input.variant_id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Variant"))?;
    let product = product::Entity::find_live()
        .filter(product::Column::Id.eq(variant.product_id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Product"))?;

    if input.quantity > variant.stock_quantity {
        return Err(DomainError::Conflict(format!(
            "Insufficient stock: requested {}, available {}",
            input.quantity, variant.stock_quantity
        )));
    }

    let unit_price = round_money(variant.unit_price(&product));
    let now = now();
    let created = reservation::ActiveModel {
        user_id: Set(owner.id),
        variant_id: Set(variant.id),
        quantity: Set(input.quantity),
        unit_price: Set(unit_price),
        total_price: Set(round_money(unit_price * input.quantity as f64)),
        status: Set(ReservationStatus::Pending.as_str().to_string()),
        notes: Set(input.notes.filter(|n| !n.trim().is_empty())),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    audit.created(&actor.actor(), &created);
    tracing::info!(
        "Reservation {} created: {} x variant {} for user {}",
        created.id,
        created.quantity,
        created.variant_id,
        created.user_id
    );
    view(db, created).await
}

/// List reservations. `scope_user` restricts the result to one owner.
pub async fn list_reservations(
    db: &DatabaseConnection,
    filter: ReservationFilter,
    scope_user: Option<i32>,
) -> Result<Paginated<ReservationView>, DomainError> {
    let mut query = Reservation::find();
    if let Some(owner) = scope_user.or(filter.user_id) {
        query = query.filter(reservation::Column::UserId.eq(owner));
    }
    if let Some(status) = filter.status {
        query = query.filter(reservation::Column::Status.eq(status.as_str()));
    }
    if let Some(variant_id) = filter.variant_id {
        query = query.filter(reservation::Column::VariantId.eq(variant_id));
    }

    let paginator = query
        .order_by_desc(reservation::Column::CreatedAt)
        .order_by_desc(reservation::Column::Id)
        .paginate(db, filter.page.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(filter.page.index()).await?;

    Ok(Paginated {
        items: views(db, items).await?,
        total,
        page: filter.page.page,
        limit: filter.page.limit,
    })
}

async fn find_visible(
    db: &DatabaseConnection,
    id: i32,
    scope_user: Option<i32>,
) -> Result<reservation::Model, DomainError> {
    Reservation::find_by_id(id)
        .one(db)
        .await?
        .filter(|r| scope_user.is_none_or(|owner| r.user_id == owner))
        .ok_or_else(|| DomainError::not_found("Reservation"))
}

/// Reservations of other users are reported as missing when scoped
pub async fn get_reservation(
    db: &DatabaseConnection,
    id: i32,
    scope_user: Option<i32>,
) -> Result<ReservationView, DomainError> {
    let reservation = find_visible(db, id, scope_user).await?;
    view(db, reservation).await
}

/// Move a reservation to `next`, applying the stock effect of the transition
pub async fn transition(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Claims,
    can_manage: bool,
    can_read_all: bool,
    id: i32,
    next: ReservationStatus,
) -> Result<ReservationView, DomainError> {
    let actor_id = actor.user_id()?;
    let scope = if can_manage || can_read_all {
        None
    } else {
        Some(actor_id)
    };
    let before = find_visible(db, id, scope).await?;

    let current: ReservationStatus = before.status.parse().map_err(DomainError::Internal)?;
    if !current.can_transition_to(next) {
        return Err(DomainError::Conflict(format!(
            "Cannot move reservation from {} to {}",
            current, next
        )));
    }

    let owner_may_cancel = current == ReservationStatus::Pending
        && next == ReservationStatus::Cancelled
        && before.user_id == actor_id;
    if !can_manage && !owner_may_cancel {
        return Err(DomainError::Forbidden(format!(
            "Not allowed to move reservation to {}",
            next
        )));
    }

    let txn = db.begin().await?;

    match (current, next) {
        (ReservationStatus::Pending, ReservationStatus::Confirmed) => {
            if !move_stock(&txn, before.variant_id, -before.quantity).await? {
                return Err(DomainError::Conflict(
                    "Insufficient stock to confirm reservation".to_string(),
                ));
            }
        }
        (ReservationStatus::Confirmed, ReservationStatus::Cancelled) => {
            if !move_stock(&txn, before.variant_id, before.quantity).await? {
                return Err(DomainError::Conflict(
                    "Cannot return stock to variant".to_string(),
                ));
            }
        }
        _ => {}
    }

    // Guarded on the current status so a concurrent transition cannot apply twice
    let updated = Reservation::update_many()
        .col_expr(reservation::Column::Status, Expr::value(next.as_str()))
        .col_expr(reservation::Column::UpdatedAt, Expr::value(now()))
        .filter(reservation::Column::Id.eq(id))
        .filter(reservation::Column::Status.eq(current.as_str()))
        .exec(&txn)
        .await?;
    if updated.rows_affected != 1 {
        return Err(DomainError::Conflict(
            "Reservation was modified concurrently".to_string(),
        ));
    }

    let after = Reservation::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::not_found("Reservation"))?;
    txn.commit().await?;

    audit.updated(&actor.actor(), &before, &after);
    tracing::info!("Reservation {} moved {} -> {}", id, current, next);
    view(db, after).await
}
