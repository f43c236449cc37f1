//! Application state containing repositories and shared resources

use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::audit::AuditLogger;
use crate::authz::{Permission, PermissionTable};
use crate::domain::{DomainError, ProductRepository, VariantRepository};
use crate::infrastructure::auth::{Claims, JwtKeys};
use crate::infrastructure::config::Config;
use crate::infrastructure::{SeaOrmProductRepository, SeaOrmVariantRepository};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub product_repo: Arc<dyn ProductRepository>,
    pub variant_repo: Arc<dyn VariantRepository>,
    /// Buffered audit trail; the flusher task holds a clone
    pub audit: AuditLogger,
    /// Role grants, reloaded after every edit
    permissions: Arc<RwLock<PermissionTable>>,
    pub keys: JwtKeys,
}

impl AppState {
    /// Create a new AppState with all repositories initialized and grants loaded
    pub async fn new(db: DatabaseConnection, config: &Config) -> Result<Self, DbErr> {
        let audit = AuditLogger::new(db.clone(), config.audit.clone());
        let permissions = PermissionTable::load(&db).await?;

        Ok(Self {
            product_repo: Arc::new(SeaOrmProductRepository::new(db.clone(), audit.clone())),
            variant_repo: Arc::new(SeaOrmVariantRepository::new(db.clone(), audit.clone())),
            audit,
            permissions: Arc::new(RwLock::new(permissions)),
            keys: JwtKeys::new(&config.auth),
            db,
        })
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn allows(&self, claims: &Claims, permission: Permission) -> bool {
        self.permissions.read().await.allows(&claims.role, permission)
    }

    /// 403 unless the caller's role holds `permission`
    pub async fn authorize(&self, claims: &Claims, permission: Permission) -> Result<(), DomainError> {
        let result = self.permissions.read().await.require(&claims.role, permission);
        if result.is_err() {
            tracing::warn!(
                "User {} ({}) denied {}",
                claims.username,
                claims.role,
                permission
            );
        }
        result
    }

    pub async fn permission_table(&self) -> PermissionTable {
        self.permissions.read().await.clone()
    }

    pub async fn reload_permissions(&self) -> Result<(), DbErr> {
        let table = PermissionTable::load(&self.db).await?;
        *self.permissions.write().await = table;
        Ok(())
    }
}

impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}
