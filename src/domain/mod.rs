//! Domain layer - Pure business abstractions
//!
//! This layer contains NO framework dependencies (no SeaORM entities, no Axum).
//! Only trait definitions, DTOs and domain error types.

pub mod errors;
pub mod repositories;

pub use errors::DomainError;
pub use repositories::*;

/// Who performed a write, as recorded in the audit trail
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Actor {
    pub user_id: Option<i32>,
    pub username: Option<String>,
}

impl Actor {
    pub fn system() -> Self {
        Self {
            user_id: None,
            username: Some("system".to_string()),
        }
    }

    pub fn user(user_id: i32, username: &str) -> Self {
        Self {
            user_id: Some(user_id),
            username: Some(username.to_string()),
        }
    }
}

/// 1-based page request, clamped to sane bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u64 = 20;
    pub const MAX_LIMIT: u64 = 100;
    /// Keeps the row offset `(page - 1) * limit` within `i64`
    pub const MAX_PAGE: u64 = i64::MAX as u64 / Self::MAX_LIMIT;

    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, Self::MAX_PAGE),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Zero-based page index for SeaORM paginators
    pub fn index(&self) -> u64 {
        self.page - 1
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}
