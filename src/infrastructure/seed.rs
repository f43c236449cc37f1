use sea_orm::*;

use crate::audit::AuditLogger;
use crate::authz::Role;
use crate::domain::{Actor, DomainError};
use crate::infrastructure::config::AdminBootstrap;
use crate::infrastructure::db::now;
use crate::models::{color, product, product_variant, size, user};
use crate::services::auth_service::insert_user;

/// Create the configured admin account unless a user with that name exists
pub async fn bootstrap_admin(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    admin: &AdminBootstrap,
) -> Result<bool, DomainError> {
    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(admin.username.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        tracing::debug!("Bootstrap admin {} already exists", admin.username);
        return Ok(false);
    }

    let created = insert_user(db, &admin.username, &admin.email, &admin.password, Role::Admin).await?;
    audit.created(&Actor::system(), &created);
    tracing::info!("Bootstrap admin {} created", created.username);
    Ok(true)
}

const DEMO_COLORS: &[(&str, &str)] = &[
    ("Black", "#000000"),
    ("White", "#FFFFFF"),
    ("Navy", "#1F2A44"),
];

const DEMO_SIZES: &[(&str, i32)] = &[("S", 10), ("M", 20), ("L", 30)];

const DEMO_PRODUCTS: &[(&str, &str, &str, f64)] = &[
    ("Classic Tee", "TEE-CLASSIC", "tops", 19.99),
    ("Slim Chinos", "CHINO-SLIM", "bottoms", 49.5),
];

/// Small catalog for local development. Skipped when products already exist.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    if product::Entity::find().count(db).await? > 0 {
        tracing::info!("Catalog not empty, skipping demo data");
        return Ok(());
    }

    let txn = db.begin().await?;
    let now = now();

    let mut color_ids = Vec::new();
    for (name, hex) in DEMO_COLORS {
        let c = color::ActiveModel {
            name: Set(name.to_string()),
            hex_code: Set(hex.to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        color_ids.push((c.id, name.to_uppercase()));
    }

    let mut size_ids = Vec::new();
    for (label, sort_order) in DEMO_SIZES {
        let s = size::ActiveModel {
            label: Set(label.to_string()),
            sort_order: Set(*sort_order),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        size_ids.push((s.id, label.to_string()));
    }

    for (name, sku, category, price) in DEMO_PRODUCTS {
        let p = product::ActiveModel {
            name: Set(name.to_string()),
            sku: Set(sku.to_string()),
            description: Set(None),
            category: Set(Some(category.to_string())),
            base_price: Set(*price),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (color_id, color_code) in &color_ids {
            for (size_id, size_label) in &size_ids {
                product_variant::ActiveModel {
                    product_id: Set(p.id),
                    color_id: Set(*color_id),
                    size_id: Set(*size_id),
                    sku: Set(format!("{}-{}-{}", sku, color_code, size_label)),
                    price_override: Set(None),
                    stock_quantity: Set(10),
                    created_at: Set(now.clone()),
                    updated_at: Set(now.clone()),
                    deleted_at: Set(None),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }
    }

    txn.commit().await?;
    tracing::info!("Demo catalog seeded");
    Ok(())
}
