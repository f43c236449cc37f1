//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and schema (db)
//! - HTTP router assembly (server)
//! - Configuration loading (config)
//! - Authentication (auth)
//! - Soft-delete scoping (soft_delete)
//! - Repository implementations (repositories)
//! - Application state (state)

pub mod auth;
pub mod config;
pub mod db;
pub mod repositories;
pub mod seed;
pub mod server;
pub mod soft_delete;
pub mod state;

pub use repositories::*;
pub use state::AppState;
