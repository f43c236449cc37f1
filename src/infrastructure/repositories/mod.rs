//! Repository implementations using SeaORM

pub mod product_repository;
pub mod variant_repository;

pub use product_repository::SeaOrmProductRepository;
pub use variant_repository::{SeaOrmVariantRepository, move_stock, variant_views};
