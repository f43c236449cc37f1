//! SeaORM implementation of ProductRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::variant_repository::variant_views;
use crate::audit::AuditLogger;
use crate::domain::{
    Actor, CascadeOutcome, DomainError, Paginated, ProductDetail, ProductFilter, ProductInput,
    ProductRepository, ProductUpdate, validate_price, validate_required,
};
use crate::infrastructure::db::now;
use crate::infrastructure::soft_delete::SoftDeletable;
use crate::models::product::{self, ActiveModel, Column, Entity as ProductEntity};
use crate::models::{ReservationStatus, product_variant, reservation};

/// SeaORM-based implementation of ProductRepository
pub struct SeaOrmProductRepository {
    db: DatabaseConnection,
    audit: AuditLogger,
}

impl SeaOrmProductRepository {
    pub fn new(db: DatabaseConnection, audit: AuditLogger) -> Self {
        Self { db, audit }
    }
}

fn active_statuses() -> Vec<&'static str> {
    ReservationStatus::ALL
        .iter()
        .filter(|s| s.is_active())
        .map(|s| s.as_str())
        .collect()
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn find_all(
        &self,
        filter: ProductFilter,
    ) -> Result<Paginated<product::Model>, DomainError> {
        let mut query = ProductEntity::find_scoped(filter.include_deleted);

        if let Some(q) = &filter.query
            && !q.trim().is_empty()
        {
            let q = q.trim();
            let cond = Condition::any()
                .add(Column::Name.contains(q))
                .add(Column::Sku.contains(q));
            query = query.filter(cond);
        }

        if let Some(category) = &filter.category
            && !category.is_empty()
        {
            query = query.filter(Column::Category.eq(category.as_str()));
        }

        let query = query.order_by_asc(Column::Name).order_by_asc(Column::Id);

        let paginator = query.paginate(&self.db, filter.page.limit);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(filter.page.index()).await?;

        Ok(Paginated {
            items,
            total,
            page: filter.page.page,
            limit: filter.page.limit,
        })
    }

    async fn find_by_id(
        &self,
        id: i32,
        include_deleted: bool,
    ) -> Result<Option<ProductDetail>, DomainError> {
        let Some(product) = ProductEntity::find_scoped(include_deleted)
            .filter(Column::Id.eq(id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let variants = product_variant::Entity::find_live()
            .filter(product_variant::Column::ProductId.eq(id))
            .order_by_asc(product_variant::Column::Id)
            .all(&self.db)
            .await?;
        let variants = variant_views(&self.db, variants).await?;

        Ok(Some(ProductDetail { product, variants }))
    }

    async fn create(
        &self,
        actor: &Actor,
        input: ProductInput,
    ) -> Result<product::Model, DomainError> {
        validate_required("name", &input.name)?;
        validate_required("sku", &input.sku)?;
        validate_price("base_price", input.base_price)?;

        let now = now();
        let new_product = ActiveModel {
            name: Set(input.name.trim().to_string()),
            sku: Set(input.sku.trim().to_string()),
            description: Set(input.description),
            category: Set(input.category),
            base_price: Set(input.base_price),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let model = new_product.insert(&self.db).await?;
        self.audit.created(actor, &model);
        tracing::info!("Product {} created ({})", model.id, model.sku);
        Ok(model)
    }

    async fn update(
        &self,
        actor: &Actor,
        id: i32,
        input: ProductUpdate,
    ) -> Result<product::Model, DomainError> {
        let existing = ProductEntity::find_live()
            .filter(Column::Id.eq(id))
            .one(&self.db)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;

        let before = existing.clone();
        let mut active: ActiveModel = existing.into();

        if let Some(name) = input.name {
            validate_required("name", &name)?;
            active.name = Set(name.trim().to_string());
        }
        if let Some(sku) = input.sku {
            validate_required("sku", &sku)?;
            active.sku = Set(sku.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(price) = input.base_price {
            validate_price("base_price", price)?;
            active.base_price = Set(price);
        }
        active.updated_at = Set(now());

        let after = active.update(&self.db).await?;
        self.audit.updated(actor, &before, &after);
        Ok(after)
    }

    async fn soft_delete(&self, actor: &Actor, id: i32) -> Result<CascadeOutcome, DomainError> {
        let txn = self.db.begin().await?;

        let existing = ProductEntity::find_live()
            .filter(Column::Id.eq(id))
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;

        let variants = product_variant::Entity::find_live()
            .filter(product_variant::Column::ProductId.eq(id))
            .all(&txn)
            .await?;
        let variant_ids: Vec<i32> = variants.iter().map(|v| v.id).collect();

        if !variant_ids.is_empty() {
            let active = reservation::Entity::find()
                .filter(reservation::Column::VariantId.is_in(variant_ids))
                .filter(reservation::Column::Status.is_in(active_statuses()))
                .count(&txn)
                .await?;
            if active > 0 {
                return Err(DomainError::Conflict(format!(
                    "Product has {} active reservation(s)",
                    active
                )));
            }
        }

        let stamp = now();
        let mut deleted_variants = Vec::with_capacity(variants.len());
        for variant in variants {
            let mut active: product_variant::ActiveModel = variant.into();
            active.deleted_at = Set(Some(stamp.clone()));
            active.updated_at = Set(stamp.clone());
            deleted_variants.push(active.update(&txn).await?);
        }

        let mut active: ActiveModel = existing.into();
        active.deleted_at = Set(Some(stamp.clone()));
        active.updated_at = Set(stamp);
        let product = active.update(&txn).await?;

        txn.commit().await?;

        self.audit.deleted(actor, &product);
        for variant in &deleted_variants {
            self.audit.deleted(actor, variant);
        }
        tracing::info!(
            "Product {} soft-deleted with {} variant(s)",
            product.id,
            deleted_variants.len()
        );

        Ok(CascadeOutcome {
            product,
            variants_affected: deleted_variants.len(),
        })
    }

    async fn restore(&self, actor: &Actor, id: i32) -> Result<CascadeOutcome, DomainError> {
        let txn = self.db.begin().await?;

        let existing = ProductEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::not_found("Product"))?;

        let Some(stamp) = existing.deleted_at.clone() else {
            return Err(DomainError::Conflict("Product is not deleted".to_string()));
        };

        // Only the variants removed by the same cascade come back.
        let variants = product_variant::Entity::find()
            .filter(product_variant::Column::ProductId.eq(id))
            .filter(product_variant::Column::DeletedAt.eq(stamp))
            .all(&txn)
            .await?;

        let now = now();
        let mut restored_variants = Vec::with_capacity(variants.len());
        for variant in variants {
            let mut active: product_variant::ActiveModel = variant.into();
            active.deleted_at = Set(None);
            active.updated_at = Set(now.clone());
            restored_variants.push(active.update(&txn).await?);
        }

        let mut active: ActiveModel = existing.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(now);
        let product = active.update(&txn).await?;

        txn.commit().await?;

        self.audit.restored(actor, &product);
        for variant in &restored_variants {
            self.audit.restored(actor, variant);
        }

        Ok(CascadeOutcome {
            product,
            variants_affected: restored_variants.len(),
        })
    }
}
