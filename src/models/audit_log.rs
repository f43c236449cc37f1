use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String, // create, update, delete, restore, or an event name
    pub actor_id: Option<i32>,
    pub actor_username: Option<String>,
    /// JSON: a snapshot for create/delete/restore, a field diff for update
    pub changes: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// API view with `changes` decoded back into JSON
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogDto {
    pub id: i32,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor_id: Option<i32>,
    pub actor_username: Option<String>,
    pub changes: Option<serde_json::Value>,
    pub created_at: String,
}

impl From<Model> for AuditLogDto {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            entity_type: model.entity_type,
            entity_id: model.entity_id,
            action: model.action,
            actor_id: model.actor_id,
            actor_username: model.actor_username,
            changes: model
                .changes
                .and_then(|c| serde_json::from_str(&c).ok()),
            created_at: model.created_at,
        }
    }
}
