//! Audit Service - read side of the audit trail

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use crate::domain::{DomainError, PageRequest, Paginated};
use crate::models::audit_log::{self, AuditLogDto, Entity as AuditLog};

#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub actor_id: Option<i32>,
    pub action: Option<String>,
    pub page: PageRequest,
}

/// Newest entries first
pub async fn list_audit_logs(
    db: &DatabaseConnection,
    filter: AuditFilter,
) -> Result<Paginated<AuditLogDto>, DomainError> {
    let mut query = AuditLog::find();
    if let Some(entity_type) = filter.entity_type {
        query = query.filter(audit_log::Column::EntityType.eq(entity_type));
    }
    if let Some(entity_id) = filter.entity_id {
        query = query.filter(audit_log::Column::EntityId.eq(entity_id));
    }
    if let Some(actor_id) = filter.actor_id {
        query = query.filter(audit_log::Column::ActorId.eq(actor_id));
    }
    if let Some(action) = filter.action {
        query = query.filter(audit_log::Column::Action.eq(action));
    }

    let paginator = query
        .order_by_desc(audit_log::Column::Id)
        .paginate(db, filter.page.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(filter.page.index()).await?;

    Ok(Paginated {
        items: items.into_iter().map(AuditLogDto::from).collect(),
        total,
        page: filter.page.page,
        limit: filter.page.limit,
    })
}

/// Full history of one entity, oldest first
pub async fn entity_history(
    db: &DatabaseConnection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<AuditLogDto>, DomainError> {
    let rows = AuditLog::find()
        .filter(audit_log::Column::EntityType.eq(entity_type))
        .filter(audit_log::Column::EntityId.eq(entity_id))
        .order_by_asc(audit_log::Column::Id)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(AuditLogDto::from).collect())
}
