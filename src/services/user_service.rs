//! User Service - account administration under the role hierarchy

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;

use super::auth_service::{insert_user, normalize_email, revoke_all_for_user};
use crate::audit::AuditLogger;
use crate::authz::{Role, can_assign, can_manage};
use crate::domain::{DomainError, PageRequest, Paginated};
use crate::infrastructure::auth::Claims;
use crate::infrastructure::db::now;
use crate::infrastructure::soft_delete::SoftDeletable;
use crate::models::user::{self, Entity as User, UserDto};

#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub include_deleted: bool,
    pub role: Option<String>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn list_users(
    db: &DatabaseConnection,
    filter: UserFilter,
) -> Result<Paginated<UserDto>, DomainError> {
    let mut query = User::find_scoped(filter.include_deleted);
    if let Some(role) = filter.role.as_deref().filter(|r| !r.is_empty()) {
        query = query.filter(user::Column::Role.eq(role));
    }

    let paginator = query
        .order_by_asc(user::Column::Username)
        .paginate(db, filter.page.limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(filter.page.index()).await?;

    Ok(Paginated {
        items: items.into_iter().map(UserDto::from).collect(),
        total,
        page: filter.page.page,
        limit: filter.page.limit,
    })
}

pub async fn get_user(
    db: &DatabaseConnection,
    id: i32,
    include_deleted: bool,
) -> Result<UserDto, DomainError> {
    User::find_scoped(include_deleted)
        .filter(user::Column::Id.eq(id))
        .one(db)
        .await?
        .map(UserDto::from)
        .ok_or_else(|| DomainError::not_found("User"))
}

fn parse_role(role: &str) -> Result<Role, DomainError> {
    role.parse::<Role>().map_err(DomainError::Validation)
}

fn ensure_can_manage(actor: &Claims, target: &user::Model) -> Result<(), DomainError> {
    if !can_manage(&actor.role, &target.role) {
        return Err(DomainError::Forbidden(format!(
            "A {} cannot manage a {} account",
            actor.role, target.role
        )));
    }
    Ok(())
}

fn ensure_can_assign(actor: &Claims, role: Role) -> Result<(), DomainError> {
    if !can_assign(&actor.role, role.as_str()) {
        return Err(DomainError::Forbidden(format!(
            "A {} cannot assign the {} role",
            actor.role, role
        )));
    }
    Ok(())
}

pub async fn create_user(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Claims,
    input: CreateUserInput,
) -> Result<UserDto, DomainError> {
    let role = parse_role(&input.role)?;
    ensure_can_assign(actor, role)?;

    let user = insert_user(db, &input.username, &input.email, &input.password, role).await?;
    audit.created(&actor.actor(), &user);
    tracing::info!(
        "User {} created {} ({})",
        actor.username,
        user.username,
        user.role
    );
    Ok(UserDto::from(user))
}

pub async fn update_user(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Claims,
    id: i32,
    input: UpdateUserInput,
) -> Result<UserDto, DomainError> {
    let before = User::find_live()
        .filter(user::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;
    ensure_can_manage(actor, &before)?;

    let mut active: user::ActiveModel = before.clone().into();

    if let Some(email) = input.email {
        let email = normalize_email(&email)?;
        if email != before.email {
            let taken = User::find()
                .filter(user::Column::Email.eq(email.as_str()))
                .filter(user::Column::Id.ne(id))
                .one(db)
                .await?;
            if taken.is_some() {
                return Err(DomainError::Conflict("email is already taken".to_string()));
            }
            active.email = Set(email);
        }
    }

    if let Some(role) = input.role {
        let role = parse_role(&role)?;
        if role.as_str() != before.role {
            ensure_can_assign(actor, role)?;
            active.role = Set(role.as_str().to_string());
        }
    }

    let deactivating = input.is_active == Some(false) && before.is_active;
    if let Some(is_active) = input.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(now());

    let txn = db.begin().await?;
    let after = active.update(&txn).await?;
    if deactivating {
        revoke_all_for_user(&txn, id).await?;
    }
    txn.commit().await?;

    audit.updated(&actor.actor(), &before, &after);
    Ok(UserDto::from(after))
}

pub async fn delete_user(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Claims,
    id: i32,
) -> Result<UserDto, DomainError> {
    if actor.user_id()? == id {
        return Err(DomainError::Forbidden(
            "You cannot delete your own account".to_string(),
        ));
    }

    let user = User::find_live()
        .filter(user::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;
    ensure_can_manage(actor, &user)?;

    let txn = db.begin().await?;
    let mut active: user::ActiveModel = user.into();
    let stamp = now();
    active.deleted_at = Set(Some(stamp.clone()));
    active.updated_at = Set(stamp);
    let deleted = active.update(&txn).await?;
    let revoked = revoke_all_for_user(&txn, id).await?;
    txn.commit().await?;

    audit.deleted(&actor.actor(), &deleted);
    tracing::info!(
        "User {} deleted by {} ({} session(s) revoked)",
        deleted.username,
        actor.username,
        revoked
    );
    Ok(UserDto::from(deleted))
}

pub async fn restore_user(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    actor: &Claims,
    id: i32,
) -> Result<UserDto, DomainError> {
    let Some(user) = User::find_deleted()
        .filter(user::Column::Id.eq(id))
        .one(db)
        .await?
    else {
        return Err(match User::find_by_id(id).one(db).await? {
            Some(_) => DomainError::Conflict("User is not deleted".to_string()),
            None => DomainError::not_found("User"),
        });
    };
    ensure_can_manage(actor, &user)?;

    let mut active: user::ActiveModel = user.into();
    active.deleted_at = Set(None);
    active.updated_at = Set(now());
    let restored = active.update(db).await?;

    audit.restored(&actor.actor(), &restored);
    Ok(UserDto::from(restored))
}
