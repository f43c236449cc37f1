//! Catalog Service - colors and sizes
//!
//! Products and variants go through their repositories; the two lookup
//! tables are simple enough to live here.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

use crate::audit::AuditLogger;
use crate::domain::{Actor, DomainError, validate_required};
use crate::infrastructure::db::now;
use crate::infrastructure::soft_delete::SoftDeletable;
use crate::models::{color, product_variant, size};

#[derive(Debug, Clone, Deserialize)]
pub struct ColorInput {
    pub name: String,
    pub hex_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColorUpdate {
    pub name: Option<String>,
    pub hex_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SizeInput {
    pub label: String,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SizeUpdate {
    pub label: Option<String>,
    pub sort_order: Option<i32>,
}

/// Accepts `#RRGGBB` and returns it uppercased
pub fn normalize_hex(hex: &str) -> Result<String, DomainError> {
    let hex = hex.trim();
    let valid = hex.len() == 7
        && hex.starts_with('#')
        && hex[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(DomainError::Validation(
            "hex_code must look like #RRGGBB".to_string(),
        ));
    }
    Ok(hex.to_ascii_uppercase())
}

async fn color_in_use(db: &DatabaseConnection, color_id: i32) -> Result<bool, DomainError> {
    Ok(product_variant::Entity::find_live()
        .filter(product_variant::Column::ColorId.eq(color_id))
        .count(db)
        .await?
        > 0)
}

async fn size_in_use(db: &DatabaseConnection, size_id: i32) -> Result<bool, DomainError> {
    Ok(product_variant::Entity::find_live()
        .filter(product_variant::Column::SizeId.eq(size_id))
        .count(db)
        .await?
        > 0)
}

// ---- Colors ----

pub async fn list_colors(
    db: &DatabaseConnection,
    include_deleted: bool,
) -> Result<Vec<color::Model>, DomainError> {
    Ok(color::Entity::find_scoped(include_deleted)
        .order_by_asc(color::Column::Name)
        .all(db)
        .await?)
}

pub async fn create_color(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    input: ColorInput,
) -> Result<color::Model, DomainError> {
    validate_required("name", &input.name)?;
    let hex_code = normalize_hex(&input.hex_code)?;
    let now = now();

    let created = color::ActiveModel {
        name: Set(input.name.trim().to_string()),
        hex_code: Set(hex_code),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    audit.created(actor, &created);
    Ok(created)
}

pub async fn update_color(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    id: i32,
    input: ColorUpdate,
) -> Result<color::Model, DomainError> {
    let before = color::Entity::find_live()
        .filter(color::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Color"))?;

    let mut active: color::ActiveModel = before.clone().into();
    if let Some(name) = input.name {
        validate_required("name", &name)?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(hex) = input.hex_code {
        active.hex_code = Set(normalize_hex(&hex)?);
    }
    active.updated_at = Set(now());
    let after = active.update(db).await?;

    audit.updated(actor, &before, &after);
    Ok(after)
}

pub async fn delete_color(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    id: i32,
) -> Result<color::Model, DomainError> {
    let color = color::Entity::find_live()
        .filter(color::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Color"))?;
    if color_in_use(db, id).await? {
        return Err(DomainError::Conflict(format!(
            "Color '{}' is used by live variants",
            color.name
        )));
    }

    let mut active: color::ActiveModel = color.into();
    let stamp = now();
    active.deleted_at = Set(Some(stamp.clone()));
    active.updated_at = Set(stamp);
    let deleted = active.update(db).await?;

    audit.deleted(actor, &deleted);
    Ok(deleted)
}

pub async fn restore_color(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    id: i32,
) -> Result<color::Model, DomainError> {
    let Some(color) = color::Entity::find_deleted()
        .filter(color::Column::Id.eq(id))
        .one(db)
        .await?
    else {
        return Err(match color::Entity::find_by_id(id).one(db).await? {
            Some(_) => DomainError::Conflict("Color is not deleted".to_string()),
            None => DomainError::not_found("Color"),
        });
    };

    let mut active: color::ActiveModel = color.into();
    active.deleted_at = Set(None);
    active.updated_at = Set(now());
    let restored = active.update(db).await?;

    audit.restored(actor, &restored);
    Ok(restored)
}

// ---- Sizes ----

pub async fn list_sizes(
    db: &DatabaseConnection,
    include_deleted: bool,
) -> Result<Vec<size::Model>, DomainError> {
    Ok(size::Entity::find_scoped(include_deleted)
        .order_by_asc(size::Column::SortOrder)
        .order_by_asc(size::Column::Label)
        .all(db)
        .await?)
}

pub async fn create_size(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    input: SizeInput,
) -> Result<size::Model, DomainError> {
    validate_required("label", &input.label)?;
    let now = now();

    let created = size::ActiveModel {
        label: Set(input.label.trim().to_string()),
        sort_order: Set(input.sort_order),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    audit.created(actor, &created);
    Ok(created)
}

pub async fn update_size(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    id: i32,
    input: SizeUpdate,
) -> Result<size::Model, DomainError> {
    let before = size::Entity::find_live()
        .filter(size::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Size"))?;

    let mut active: size::ActiveModel = before.clone().into();
    if let Some(label) = input.label {
        validate_required("label", &label)?;
        active.label = Set(label.trim().to_string());
    }
    if let Some(sort_order) = input.sort_order {
        active.sort_order = Set(sort_order);
    }
    active.updated_at = Set(now());
    let after = active.update(db).await?;

    audit.updated(actor, &before, &after);
    Ok(after)
}

pub async fn delete_size(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    id: i32,
) -> Result<size::Model, DomainError> {
    let size = size::Entity::find_live()
        .filter(size::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Size"))?;
    if size_in_use(db, id).await? {
        return Err(DomainError::Conflict(format!(
            "Size '{}' is used by live variants",
            size.label
        )));
    }

    let mut active: size::ActiveModel = size.into();
    let stamp = now();
    active.deleted_at = Set(Some(stamp.clone()));
    active.updated_at = Set(stamp);
    let deleted = active.update(db).await?;

    audit.deleted(actor, &deleted);
    Ok(deleted)
}

pub async fn restore_size(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    id: i32,
) -> Result<size::Model, DomainError> {
    let Some(size) = size::Entity::find_deleted()
        .filter(size::Column::Id.eq(id))
        .one(db)
        .await?
    else {
        return Err(match size::Entity::find_by_id(id).one(db).await? {
            Some(_) => DomainError::Conflict("Size is not deleted".to_string()),
            None => DomainError::not_found("Size"),
        });
    };

    let mut active: size::ActiveModel = size.into();
    active.deleted_at = Set(None);
    active.updated_at = Set(now());
    let restored = active.update(db).await?;

    audit.restored(actor, &restored);
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::normalize_hex;

    #[test]
    fn hex_codes() {
        assert_eq!(normalize_hex("#ff00aa").unwrap(), "#FF00AA");
        assert!(normalize_hex("ff00aa").is_err());
        assert!(normalize_hex("#ff00a").is_err());
        assert!(normalize_hex("#gg00aa").is_err());
    }
}
