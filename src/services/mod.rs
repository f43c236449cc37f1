//! Services Layer
//!
//! Business logic extracted from HTTP handlers. Every write goes through the
//! audit logger after it is persisted.

pub mod audit_service;
pub mod auth_service;
pub mod catalog_service;
pub mod dashboard_service;
pub mod reservation_service;
pub mod role_service;
pub mod user_service;
