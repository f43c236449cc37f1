//! Permission codes and the role → permission lookup table

use once_cell::sync::Lazy;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use super::roles::{Role, is_admin};
use crate::domain::DomainError;
use crate::models::role_permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "products:write")]
    ProductsWrite,
    #[serde(rename = "products:delete")]
    ProductsDelete,
    #[serde(rename = "catalog:restore")]
    CatalogRestore,
    #[serde(rename = "inventory:write")]
    InventoryWrite,
    #[serde(rename = "reservations:create")]
    ReservationsCreate,
    #[serde(rename = "reservations:read_all")]
    ReservationsReadAll,
    #[serde(rename = "reservations:manage")]
    ReservationsManage,
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:manage")]
    UsersManage,
    #[serde(rename = "roles:manage")]
    RolesManage,
    #[serde(rename = "audit:read")]
    AuditRead,
    #[serde(rename = "dashboard:read")]
    DashboardRead,
}

impl Permission {
    pub const ALL: [Permission; 12] = [
        Permission::ProductsWrite,
        Permission::ProductsDelete,
        Permission::CatalogRestore,
        Permission::InventoryWrite,
        Permission::ReservationsCreate,
        Permission::ReservationsReadAll,
        Permission::ReservationsManage,
        Permission::UsersRead,
        Permission::UsersManage,
        Permission::RolesManage,
        Permission::AuditRead,
        Permission::DashboardRead,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Permission::ProductsWrite => "products:write",
            Permission::ProductsDelete => "products:delete",
            Permission::CatalogRestore => "catalog:restore",
            Permission::InventoryWrite => "inventory:write",
            Permission::ReservationsCreate => "reservations:create",
            Permission::ReservationsReadAll => "reservations:read_all",
            Permission::ReservationsManage => "reservations:manage",
            Permission::UsersRead => "users:read",
            Permission::UsersManage => "users:manage",
            Permission::RolesManage => "roles:manage",
            Permission::AuditRead => "audit:read",
            Permission::DashboardRead => "dashboard:read",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.code() == s)
            .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

static DEFAULT_GRANTS: Lazy<Vec<(Role, Vec<Permission>)>> = Lazy::new(|| {
    use Permission::*;

    let customer = vec![ReservationsCreate];
    let mut staff = customer.clone();
    staff.extend([
        ReservationsReadAll,
        ReservationsManage,
        InventoryWrite,
        DashboardRead,
    ]);
    let mut manager = staff.clone();
    manager.extend([
        ProductsWrite,
        ProductsDelete,
        CatalogRestore,
        UsersRead,
        AuditRead,
    ]);

    vec![
        (Role::Customer, customer),
        (Role::Staff, staff),
        (Role::Manager, manager),
        (Role::Admin, Permission::ALL.to_vec()),
    ]
});

/// Grants written to `role_permissions` on first start
pub fn default_grants() -> &'static [(Role, Vec<Permission>)] {
    &DEFAULT_GRANTS
}

#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    grants: HashMap<String, HashSet<Permission>>,
}

impl PermissionTable {
    pub fn defaults() -> Self {
        Self::from_pairs(default_grants().iter().flat_map(|(role, perms)| {
            perms.iter().map(move |p| (role.as_str().to_string(), p.code().to_string()))
        }))
    }

    /// Build from `(role, permission code)` rows; unknown codes are skipped.
    pub fn from_pairs<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut grants: HashMap<String, HashSet<Permission>> = HashMap::new();
        for (role, code) in rows {
            match code.parse::<Permission>() {
                Ok(p) => {
                    grants.entry(role).or_default().insert(p);
                }
                Err(e) => tracing::warn!("Ignoring grant for role {}: {}", role, e),
            }
        }
        Self { grants }
    }

    pub async fn load(db: &DatabaseConnection) -> Result<Self, DbErr> {
        let rows = role_permission::Entity::find().all(db).await?;
        Ok(Self::from_pairs(
            rows.into_iter().map(|r| (r.role, r.permission)),
        ))
    }

    /// Admin is allowed everything regardless of stored grants.
    pub fn allows(&self, role: &str, permission: Permission) -> bool {
        is_admin(role)
            || self
                .grants
                .get(role)
                .is_some_and(|set| set.contains(&permission))
    }

    pub fn require(&self, role: &str, permission: Permission) -> Result<(), DomainError> {
        if self.allows(role, permission) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "Missing permission {}",
                permission
            )))
        }
    }

    /// Effective permissions of a role, sorted
    pub fn permissions_for(&self, role: &str) -> Vec<Permission> {
        let mut perms: Vec<Permission> = if is_admin(role) {
            Permission::ALL.to_vec()
        } else {
            self.grants
                .get(role)
                .map(|s| s.iter().copied().collect())
                .unwrap_or_default()
        };
        perms.sort();
        perms
    }
}
