//! Repository trait definitions
//!
//! These traits define the contract for catalog data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Actor, DomainError, PageRequest};
use crate::models::product;

/// Filter criteria for product queries
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    /// Substring of name or sku
    pub query: Option<String>,
    pub category: Option<String>,
    pub include_deleted: bool,
    pub page: PageRequest,
}

/// One page of results with the total match count
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Input for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub base_price: f64,
}

/// Partial product update; `Some(None)` clears an optional field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
    pub base_price: Option<f64>,
}

/// Variant enriched with color/size names and the effective price
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VariantView {
    pub id: i32,
    pub product_id: i32,
    pub color_id: i32,
    pub color_name: Option<String>,
    pub size_id: i32,
    pub size_label: Option<String>,
    pub sku: String,
    pub price_override: Option<f64>,
    pub unit_price: f64,
    pub stock_quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
}

/// Product with its variants
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub variants: Vec<VariantView>,
}

/// Result of a cascading soft delete or restore
#[derive(Debug, Clone, Serialize)]
pub struct CascadeOutcome {
    pub product: product::Model,
    pub variants_affected: usize,
}

/// Input for creating a variant
#[derive(Debug, Clone, Deserialize)]
pub struct VariantInput {
    pub color_id: i32,
    pub size_id: i32,
    pub sku: String,
    pub price_override: Option<f64>,
    #[serde(default)]
    pub stock_quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantUpdate {
    pub color_id: Option<i32>,
    pub size_id: Option<i32>,
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub price_override: Option<Option<f64>>,
}

/// Relative stock movement (receipt, shrinkage, correction)
#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustment {
    pub delta: i32,
    pub reason: Option<String>,
}

/// Repository trait for Product entity
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find products matching the filter, one page at a time
    async fn find_all(&self, filter: ProductFilter)
    -> Result<Paginated<product::Model>, DomainError>;

    /// Find a product with its live variants
    async fn find_by_id(
        &self,
        id: i32,
        include_deleted: bool,
    ) -> Result<Option<ProductDetail>, DomainError>;

    async fn create(&self, actor: &Actor, input: ProductInput)
    -> Result<product::Model, DomainError>;

    async fn update(
        &self,
        actor: &Actor,
        id: i32,
        input: ProductUpdate,
    ) -> Result<product::Model, DomainError>;

    /// Soft delete the product and its live variants together
    async fn soft_delete(&self, actor: &Actor, id: i32) -> Result<CascadeOutcome, DomainError>;

    /// Restore the product and the variants deleted alongside it
    async fn restore(&self, actor: &Actor, id: i32) -> Result<CascadeOutcome, DomainError>;
}

/// Repository trait for ProductVariant entity
#[async_trait]
pub trait VariantRepository: Send + Sync {
    async fn find_by_product(
        &self,
        product_id: i32,
        include_deleted: bool,
    ) -> Result<Vec<VariantView>, DomainError>;

    async fn find_by_id(
        &self,
        id: i32,
        include_deleted: bool,
    ) -> Result<Option<VariantView>, DomainError>;

    async fn create(
        &self,
        actor: &Actor,
        product_id: i32,
        input: VariantInput,
    ) -> Result<VariantView, DomainError>;

    async fn update(
        &self,
        actor: &Actor,
        id: i32,
        input: VariantUpdate,
    ) -> Result<VariantView, DomainError>;

    async fn soft_delete(&self, actor: &Actor, id: i32) -> Result<VariantView, DomainError>;

    async fn restore(&self, actor: &Actor, id: i32) -> Result<VariantView, DomainError>;

    /// Apply a stock delta; the result may not go below zero
    async fn adjust_stock(
        &self,
        actor: &Actor,
        id: i32,
        adjustment: StockAdjustment,
    ) -> Result<VariantView, DomainError>;
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Round a monetary amount to cents
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn validate_price(field: &str, value: f64) -> Result<(), DomainError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::Validation(format!(
            "{} must be a non-negative number",
            field
        )));
    }
    Ok(())
}

pub fn validate_required(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
