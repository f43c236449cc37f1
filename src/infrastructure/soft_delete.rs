//! Soft-delete scoping for entities carrying a nullable `deleted_at` column

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

use crate::models::{color, product, product_variant, size, user};

pub trait SoftDeletable: EntityTrait {
    fn deleted_at_column() -> Self::Column;

    /// Rows that have not been soft-deleted
    fn find_live() -> Select<Self> {
        Self::find().filter(Self::deleted_at_column().is_null())
    }

    fn find_deleted() -> Select<Self> {
        Self::find().filter(Self::deleted_at_column().is_not_null())
    }

    fn find_with_deleted() -> Select<Self> {
        Self::find()
    }

    /// Live rows, or every row when `include_deleted` is set
    fn find_scoped(include_deleted: bool) -> Select<Self> {
        if include_deleted {
            Self::find_with_deleted()
        } else {
            Self::find_live()
        }
    }
}

impl SoftDeletable for product::Entity {
    fn deleted_at_column() -> Self::Column {
        product::Column::DeletedAt
    }
}

impl SoftDeletable for product_variant::Entity {
    fn deleted_at_column() -> Self::Column {
        product_variant::Column::DeletedAt
    }
}

impl SoftDeletable for color::Entity {
    fn deleted_at_column() -> Self::Column {
        color::Column::DeletedAt
    }
}

impl SoftDeletable for size::Entity {
    fn deleted_at_column() -> Self::Column {
        size::Column::DeletedAt
    }
}

impl SoftDeletable for user::Entity {
    fn deleted_at_column() -> Self::Column {
        user::Column::DeletedAt
    }
}
