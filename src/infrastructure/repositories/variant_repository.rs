//! SeaORM implementation of VariantRepository

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};

use crate::audit::AuditLogger;
use crate::domain::{
    Actor, DomainError, StockAdjustment, VariantInput, VariantRepository, VariantUpdate,
    VariantView, validate_price, validate_required,
};
use crate::infrastructure::db::now;
use crate::infrastructure::soft_delete::SoftDeletable;
use crate::models::product_variant::{self, ActiveModel, Column, Entity as VariantEntity};
use crate::models::{ReservationStatus, color, product, reservation, size};

/// SeaORM-based implementation of VariantRepository
pub struct SeaOrmVariantRepository {
    db: DatabaseConnection,
    audit: AuditLogger,
}

impl SeaOrmVariantRepository {
    pub fn new(db: DatabaseConnection, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    async fn live_variant(&self, id: i32) -> Result<product_variant::Model, DomainError> {
        VariantEntity::find_live()
            .filter(Column::Id.eq(id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Variant"))
    }

    async fn view(&self, model: product_variant::Model) -> Result<VariantView, DomainError> {
        let mut views = variant_views(&self.db, vec![model]).await?;
        views
            .pop()
            .ok_or_else(|| DomainError::Internal("Variant view missing".to_string()))
    }

    async fn ensure_color(&self, id: i32) -> Result<(), DomainError> {
        color::Entity::find_live()
            .filter(color::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::Validation(format!("Unknown color {}", id)))
    }

    async fn ensure_size(&self, id: i32) -> Result<(), DomainError> {
        size::Entity::find_live()
            .filter(size::Column::Id.eq(id))
            .one(&self.db)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::Validation(format!("Unknown size {}", id)))
    }

    /// A live variant other than `except` already holds this product/color/size
    async fn combo_taken(
        &self,
        product_id: i32,
        color_id: i32,
        size_id: i32,
        except: Option<i32>,
    ) -> Result<bool, DomainError> {
        let mut query = VariantEntity::find_live()
            .filter(Column::ProductId.eq(product_id))
            .filter(Column::ColorId.eq(color_id))
            .filter(Column::SizeId.eq(size_id));
        if let Some(id) = except {
            query = query.filter(Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}

/// Join variants with their product, color and size for display
pub async fn variant_views(
    db: &DatabaseConnection,
    variants: Vec<product_variant::Model>,
) -> Result<Vec<VariantView>, DbErr> {
    if variants.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: HashSet<i32> = variants.iter().map(|v| v.product_id).collect();
    let color_ids: HashSet<i32> = variants.iter().map(|v| v.color_id).collect();
    let size_ids: HashSet<i32> = variants.iter().map(|v| v.size_id).collect();

    let products: HashMap<i32, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let colors: HashMap<i32, String> = color::Entity::find()
        .filter(color::Column::Id.is_in(color_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let sizes: HashMap<i32, String> = size::Entity::find()
        .filter(size::Column::Id.is_in(size_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.label))
        .collect();

    Ok(variants
        .into_iter()
        .map(|v| {
            let unit_price = products
                .get(&v.product_id)
                .map(|p| v.unit_price(p))
                .or(v.price_override)
                .unwrap_or_default();
            VariantView {
                id: v.id,
                product_id: v.product_id,
                color_id: v.color_id,
                color_name: colors.get(&v.color_id).cloned(),
                size_id: v.size_id,
                size_label: sizes.get(&v.size_id).cloned(),
                sku: v.sku,
                price_override: v.price_override,
                unit_price,
                stock_quantity: v.stock_quantity,
                deleted_at: v.deleted_at,
            }
        })
        .collect())
}

/// Atomically add `delta` to a live variant's stock, keeping it within `0..=i32::MAX`.
/// Returns false when the variant is missing/deleted or the result is out of range.
pub async fn move_stock<C: ConnectionTrait>(
    conn: &C,
    variant_id: i32,
    delta: i32,
) -> Result<bool, DbErr> {
    let result = VariantEntity::update_many()
        .col_expr(
            Column::StockQuantity,
            Expr::col(Column::StockQuantity).add(delta),
        )
        .col_expr(Column::UpdatedAt, Expr::value(now()))
        .filter(Column::Id.eq(variant_id))
        .filter(Column::DeletedAt.is_null())
        // SQLite integers are 64-bit, so the sum cannot overflow here
        .filter(Expr::expr(Expr::col(Column::StockQuantity).add(delta)).between(0, i32::MAX))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

#[async_trait]
impl VariantRepository for SeaOrmVariantRepository {
    async fn find_by_product(
        &self,
        product_id: i32,
        include_deleted: bool,
    ) -> Result<Vec<VariantView>, DomainError> {
        product::Entity::find_scoped(include_deleted)
            .filter(product::Column::Id.eq(product_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;

        let variants = VariantEntity::find_scoped(include_deleted)
            .filter(Column::ProductId.eq(product_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await?;

        Ok(variant_views(&self.db, variants).await?)
    }

    async fn find_by_id(
        &self,
        id: i32,
        include_deleted: bool,
    ) -> Result<Option<VariantView>, DomainError> {
        match VariantEntity::find_scoped(include_deleted)
            .filter(Column::Id.eq(id))
            .one(&self.db)
            .await?
        {
            Some(model) => Ok(Some(self.view(model).await?)),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        actor: &Actor,
        product_id: i32,
        input: VariantInput,
    ) -> Result<VariantView, DomainError> {
        product::Entity::find_live()
            .filter(product::Column::Id.eq(product_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;

        validate_required("sku", &input.sku)?;
        if input.stock_quantity < 0 {
            return Err(DomainError::Validation(
                "stock_quantity must not be negative".to_string(),
            ));
        }
        if let Some(price) = input.price_override {
            validate_price("price_override", price)?;
        }
        self.ensure_color(input.color_id).await?;
        self.ensure_size(input.size_id).await?;

        if self
            .combo_taken(product_id, input.color_id, input.size_id, None)
            .await?
        {
            return Err(DomainError::Conflict(
                "A variant with this color and size already exists".to_string(),
            ));
        }

        let now = now();
        let new_variant = ActiveModel {
            product_id: Set(product_id),
            color_id: Set(input.color_id),
            size_id: Set(input.size_id),
            sku: Set(input.sku.trim().to_string()),
            price_override: Set(input.price_override),
            stock_quantity: Set(input.stock_quantity),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let model = new_variant.insert(&self.db).await?;
        self.audit.created(actor, &model);
        self.view(model).await
    }

    async fn update(
        &self,
        actor: &Actor,
        id: i32,
        input: VariantUpdate,
    ) -> Result<VariantView, DomainError> {
        let existing = self.live_variant(id).await?;

        let color_id = input.color_id.unwrap_or(existing.color_id);
        let size_id = input.size_id.unwrap_or(existing.size_id);

        if color_id != existing.color_id {
            self.ensure_color(color_id).await?;
        }
        if size_id != existing.size_id {
            self.ensure_size(size_id).await?;
        }
        if (color_id, size_id) != (existing.color_id, existing.size_id)
            && self
                .combo_taken(existing.product_id, color_id, size_id, Some(id))
                .await?
        {
            return Err(DomainError::Conflict(
                "A variant with this color and size already exists".to_string(),
            ));
        }

        let before = existing.clone();
        let mut active: ActiveModel = existing.into();
        active.color_id = Set(color_id);
        active.size_id = Set(size_id);
        if let Some(sku) = input.sku {
            validate_required("sku", &sku)?;
            active.sku = Set(sku.trim().to_string());
        }
        if let Some(price) = input.price_override {
            if let Some(p) = price {
                validate_price("price_override", p)?;
            }
            active.price_override = Set(price);
        }
        active.updated_at = Set(now());

        let after = active.update(&self.db).await?;
        self.audit.updated(actor, &before, &after);
        self.view(after).await
    }

    async fn soft_delete(&self, actor: &Actor, id: i32) -> Result<VariantView, DomainError> {
        let existing = self.live_variant(id).await?;

        let active_statuses: Vec<&str> = ReservationStatus::ALL
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.as_str())
            .collect();
        let active = reservation::Entity::find()
            .filter(reservation::Column::VariantId.eq(id))
            .filter(reservation::Column::Status.is_in(active_statuses))
            .count(&self.db)
            .await?;
        if active > 0 {
            return Err(DomainError::Conflict(format!(
                "Variant has {} active reservation(s)",
                active
            )));
        }

        let stamp = now();
        let mut model: ActiveModel = existing.into();
        model.deleted_at = Set(Some(stamp.clone()));
        model.updated_at = Set(stamp);
        let deleted = model.update(&self.db).await?;

        self.audit.deleted(actor, &deleted);
        self.view(deleted).await
    }

    async fn restore(&self, actor: &Actor, id: i32) -> Result<VariantView, DomainError> {
        let existing = VariantEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Variant"))?;

        if existing.deleted_at.is_none() {
            return Err(DomainError::Conflict("Variant is not deleted".to_string()));
        }

        let product_live = product::Entity::find_live()
            .filter(product::Column::Id.eq(existing.product_id))
            .count(&self.db)
            .await?
            > 0;
        if !product_live {
            return Err(DomainError::Conflict(
                "Restore the product before its variants".to_string(),
            ));
        }

        if self
            .combo_taken(existing.product_id, existing.color_id, existing.size_id, Some(id))
            .await?
        {
            return Err(DomainError::Conflict(
                "Another live variant uses this color and size".to_string(),
            ));
        }

        let mut model: ActiveModel = existing.into();
        model.deleted_at = Set(None);
        model.updated_at = Set(now());
        let restored = model.update(&self.db).await?;

        self.audit.restored(actor, &restored);
        self.view(restored).await
    }

    async fn adjust_stock(
        &self,
        actor: &Actor,
        id: i32,
        adjustment: StockAdjustment,
    ) -> Result<VariantView, DomainError> {
        if adjustment.delta == 0 {
            return Err(DomainError::Validation("delta must not be zero".to_string()));
        }

        let before = self.live_variant(id).await?;

        if !move_stock(&self.db, id, adjustment.delta).await? {
            // Lost a race with a delete, or the result is out of range.
            self.live_variant(id).await?;
            let message = if adjustment.delta < 0 {
                "Insufficient stock"
            } else {
                "Stock limit exceeded"
            };
            return Err(DomainError::Conflict(format!(
                "{}: {} on hand, adjustment {}",
                message, before.stock_quantity, adjustment.delta
            )));
        }

        let after = self.live_variant(id).await?;
        self.audit.event(
            actor,
            "product_variant",
            id,
            "stock_adjust",
            Some(json!({
                "delta": adjustment.delta,
                "reason": adjustment.reason,
                "stock_quantity": { "old": before.stock_quantity, "new": after.stock_quantity },
            })),
        );
        tracing::info!(
            "Stock for variant {} moved by {} to {}",
            id,
            adjustment.delta,
            after.stock_quantity
        );

        self.view(after).await
    }
}
