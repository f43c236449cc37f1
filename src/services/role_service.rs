//! Role Service - role listing and permission grants

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;

use crate::audit::AuditLogger;
use crate::authz::{Permission, PermissionTable, is_admin};
use crate::domain::{Actor, DomainError};
use crate::models::{role, role_permission};

#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    pub name: String,
    pub rank: i32,
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
}

pub async fn list_roles(
    db: &DatabaseConnection,
    table: &PermissionTable,
) -> Result<Vec<RoleView>, DomainError> {
    let roles = role::Entity::find()
        .order_by_asc(role::Column::Rank)
        .all(db)
        .await?;

    Ok(roles
        .into_iter()
        .map(|r| RoleView {
            permissions: table.permissions_for(&r.name),
            name: r.name,
            rank: r.rank,
            description: r.description,
        })
        .collect())
}

/// Parse permission codes, rejecting unknown ones. Duplicates collapse.
pub fn parse_codes(codes: &[String]) -> Result<Vec<Permission>, DomainError> {
    let parsed: Result<BTreeSet<Permission>, String> =
        codes.iter().map(|c| c.parse::<Permission>()).collect();
    parsed
        .map(|set| set.into_iter().collect())
        .map_err(DomainError::Validation)
}

/// Replace every grant of `role_name`. The caller reloads the in-memory table.
pub async fn replace_role_permissions(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Actor,
    role_name: &str,
    codes: &[String],
) -> Result<Vec<Permission>, DomainError> {
    role::Entity::find()
        .filter(role::Column::Name.eq(role_name))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Role"))?;

    if is_admin(role_name) {
        return Err(DomainError::Validation(
            "Admin permissions cannot be changed".to_string(),
        ));
    }

    let permissions = parse_codes(codes)?;

    let txn = db.begin().await?;
    let previous: Vec<String> = role_permission::Entity::find()
        .filter(role_permission::Column::Role.eq(role_name))
        .order_by_asc(role_permission::Column::Permission)
        .all(&txn)
        .await?
        .into_iter()
        .map(|r| r.permission)
        .collect();

    role_permission::Entity::delete_many()
        .filter(role_permission::Column::Role.eq(role_name))
        .exec(&txn)
        .await?;

    for permission in &permissions {
        role_permission::ActiveModel {
            role: Set(role_name.to_string()),
            permission: Set(permission.code().to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }
    txn.commit().await?;

    let current: Vec<&str> = permissions.iter().map(|p| p.code()).collect();
    audit.event(
        actor,
        "role",
        role_name,
        "permissions_update",
        Some(json!({ "permissions": { "old": previous, "new": current } })),
    );
    tracing::info!("Permissions of role {} replaced: {:?}", role_name, current);
    Ok(permissions)
}
