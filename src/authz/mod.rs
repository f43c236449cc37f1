//! Authorization: role ranks and permission lookups

pub mod permissions;
pub mod roles;

pub use permissions::{Permission, PermissionTable, default_grants};
pub use roles::{Role, can_assign, can_manage, is_admin, rank};
