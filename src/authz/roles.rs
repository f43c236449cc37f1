//! Static role hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Staff,
    Manager,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Customer, Role::Staff, Role::Manager, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Staff => "staff",
            Role::Manager => "manager",
            Role::Admin => "admin",
        }
    }

    pub fn rank(&self) -> i32 {
        match self {
            Role::Customer => 10,
            Role::Staff => 20,
            Role::Manager => 30,
            Role::Admin => 40,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Customer => "Shopper placing reservations",
            Role::Staff => "Store staff handling stock and reservations",
            Role::Manager => "Catalog and team management",
            Role::Admin => "Full access",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Rank of a stored role name; unknown roles rank below everyone.
pub fn rank(role: &str) -> i32 {
    role.parse::<Role>().map(|r| r.rank()).unwrap_or(0)
}

pub fn is_admin(role: &str) -> bool {
    role == Role::Admin.as_str()
}

/// Whether `actor_role` may modify, delete or restore a user holding `target_role`.
pub fn can_manage(actor_role: &str, target_role: &str) -> bool {
    is_admin(actor_role) || rank(actor_role) > rank(target_role)
}

/// Whether `actor_role` may hand out `role` to someone.
pub fn can_assign(actor_role: &str, role: &str) -> bool {
    if role.parse::<Role>().is_err() {
        return false;
    }
    is_admin(actor_role) || rank(actor_role) > rank(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_ordered() {
        assert!(rank("admin") > rank("manager"));
        assert!(rank("manager") > rank("staff"));
        assert!(rank("staff") > rank("customer"));
        assert_eq!(rank("ghost"), 0);
    }

    #[test]
    fn managers_cannot_touch_peers_or_superiors() {
        assert!(can_manage("manager", "staff"));
        assert!(can_manage("manager", "customer"));
        assert!(!can_manage("manager", "manager"));
        assert!(!can_manage("manager", "admin"));
        assert!(can_manage("admin", "admin"));
        assert!(!can_manage("customer", "customer"));
    }

    #[test]
    fn assignment_requires_strictly_lower_rank() {
        assert!(can_assign("manager", "staff"));
        assert!(!can_assign("manager", "manager"));
        assert!(can_assign("admin", "admin"));
        assert!(!can_assign("admin", "superuser"));
    }
}
