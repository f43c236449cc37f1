//! Dashboard Service - inventory and reservation counters

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::domain::DomainError;
use crate::infrastructure::soft_delete::SoftDeletable;
use crate::models::{ReservationStatus, product, product_variant, reservation};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;
/// Low-stock rows returned alongside the count
const LOW_STOCK_LIST_LIMIT: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct LowStockItem {
    pub variant_id: i32,
    pub sku: String,
    pub product_name: Option<String>,
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub products: u64,
    pub variants: u64,
    pub units_in_stock: i64,
    pub low_stock_threshold: i32,
    pub low_stock_count: u64,
    pub low_stock: Vec<LowStockItem>,
    pub reservations: BTreeMap<String, u64>,
}

pub async fn summary(
    db: &DatabaseConnection,
    low_stock_threshold: i32,
) -> Result<DashboardSummary, DomainError> {
    let products = product::Entity::find_live().count(db).await?;
    let variants = product_variant::Entity::find_live().all(db).await?;

    let units_in_stock = variants.iter().map(|v| v.stock_quantity as i64).sum();

    let mut low: Vec<&product_variant::Model> = variants
        .iter()
        .filter(|v| v.stock_quantity <= low_stock_threshold)
        .collect();
    low.sort_by_key(|v| (v.stock_quantity, v.id));
    let low_stock_count = low.len() as u64;

    let product_names: HashMap<i32, String> = product::Entity::find()
        .filter(product::Column::Id.is_in(low.iter().map(|v| v.product_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let low_stock = low
        .into_iter()
        .take(LOW_STOCK_LIST_LIMIT)
        .map(|v| LowStockItem {
            variant_id: v.id,
            sku: v.sku.clone(),
            product_name: product_names.get(&v.product_id).cloned(),
            stock_quantity: v.stock_quantity,
        })
        .collect();

    let mut reservations = BTreeMap::new();
    for status in ReservationStatus::ALL {
        let count = reservation::Entity::find()
            .filter(reservation::Column::Status.eq(status.as_str()))
            .count(db)
            .await?;
        reservations.insert(status.as_str().to_string(), count);
    }

    Ok(DashboardSummary {
        products,
        variants: variants.len() as u64,
        units_in_stock,
        low_stock_threshold,
        low_stock_count,
        low_stock,
        reservations,
    })
}
