//! Auth Service - registration, login and refresh-token rotation

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::AuditLogger;
use crate::authz::Role;
use crate::domain::{Actor, DomainError};
use crate::infrastructure::auth::{
    JwtKeys, create_jwt, generate_refresh_token, hash_password, hash_token, verify_password,
};
use crate::infrastructure::db::now;
use crate::infrastructure::soft_delete::SoftDeletable;
use crate::models::user::{self, Entity as User, UserDto};
use crate::models::refresh_token::{self, Entity as RefreshToken};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Returned by login and refresh
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub refresh_token: String,
    pub user: UserDto,
}

pub fn validate_username(username: &str) -> Result<(), DomainError> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(DomainError::Validation(
            "username must be 3 to 32 characters".to_string(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(DomainError::Validation(
            "username may only contain letters, digits, '_', '.' and '-'".to_string(),
        ));
    }
    Ok(())
}

/// Returns the normalised (trimmed, lowercase) address
pub fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::Validation("email is not valid".to_string()));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Validate and insert a user row. Shared by registration, admin creation and bootstrap.
pub async fn insert_user(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password: &str,
    role: Role,
) -> Result<user::Model, DomainError> {
    let username = username.trim();
    validate_username(username)?;
    let email = normalize_email(email)?;
    validate_password(password)?;

    // Usernames and emails stay reserved by soft-deleted accounts too.
    let taken = User::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(username))
                .add(user::Column::Email.eq(email.as_str())),
        )
        .one(db)
        .await?;
    if let Some(existing) = taken {
        let field = if existing.username == username {
            "username"
        } else {
            "email"
        };
        return Err(DomainError::Conflict(format!("{} is already taken", field)));
    }

    let password_hash = hash_password(password).map_err(DomainError::Internal)?;
    let now = now();
    let model = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role.as_str().to_string()),
        is_active: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };

    Ok(model.insert(db).await?)
}

pub async fn register(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    input: RegisterInput,
) -> Result<UserDto, DomainError> {
    let user = insert_user(
        db,
        &input.username,
        &input.email,
        &input.password,
        Role::Customer,
    )
    .await?;

    audit.created(&Actor::user(user.id, &user.username), &user);
    tracing::info!("Registered user {} ({})", user.id, user.username);
    Ok(UserDto::from(user))
}

async fn issue_tokens<C: ConnectionTrait>(
    conn: &C,
    keys: &JwtKeys,
    user: &user::Model,
    family_id: Option<String>,
) -> Result<(TokenPair, refresh_token::Model), DomainError> {
    let access_token =
        create_jwt(keys, user.id, &user.username, &user.role).map_err(DomainError::Internal)?;
    let raw_refresh = generate_refresh_token();
    let issued = Utc::now();

    let row = refresh_token::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        user_id: Set(user.id),
        family_id: Set(family_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string())),
        token_hash: Set(hash_token(&raw_refresh)),
        expires_at: Set((issued + keys.refresh_ttl()).to_rfc3339()),
        revoked_at: Set(None),
        replaced_by: Set(None),
        created_at: Set(issued.to_rfc3339()),
    }
    .insert(conn)
    .await?;

    let pair = TokenPair {
        access_token,
        token_type: "Bearer",
        expires_in: keys.access_ttl().num_seconds(),
        refresh_token: raw_refresh,
        user: UserDto::from(user.clone()),
    };
    Ok((pair, row))
}

pub async fn login(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    keys: &JwtKeys,
    login: &str,
    password: &str,
) -> Result<TokenPair, DomainError> {
    let login = login.trim();
    let invalid = || DomainError::Unauthorized("Invalid credentials".to_string());

    let user = User::find_live()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(login))
                .add(user::Column::Email.eq(login.to_lowercase())),
        )
        .one(db)
        .await?;

    let Some(user) = user else {
        tracing::warn!("Login attempt for unknown user: {}", login);
        audit.event(
            &Actor::default(),
            "auth",
            login,
            "login_failed",
            Some(json!({ "reason": "unknown_user" })),
        );
        return Err(invalid());
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => {}
        _ => {
            tracing::warn!("Password verification failed for user: {}", user.username);
            audit.event(
                &Actor::user(user.id, &user.username),
                "user",
                user.id,
                "login_failed",
                Some(json!({ "reason": "bad_password" })),
            );
            return Err(invalid());
        }
    }

    if !user.can_sign_in() {
        return Err(DomainError::Unauthorized("Account is disabled".to_string()));
    }

    let (pair, _) = issue_tokens(db, keys, &user, None).await?;
    audit.event(
        &Actor::user(user.id, &user.username),
        "user",
        user.id,
        "login",
        None,
    );
    tracing::info!("User {} logged in", user.username);
    Ok(pair)
}

fn is_expired(expires_at: &str) -> bool {
    match DateTime::parse_from_rfc3339(expires_at) {
        Ok(at) => at.with_timezone(&Utc) <= Utc::now(),
        Err(_) => true,
    }
}

/// Revoke every live token of a family
async fn revoke_family<C: ConnectionTrait>(conn: &C, family_id: &str) -> Result<u64, DbErr> {
    let result = RefreshToken::update_many()
        .col_expr(refresh_token::Column::RevokedAt, Expr::value(now()))
        .filter(refresh_token::Column::FamilyId.eq(family_id))
        .filter(refresh_token::Column::RevokedAt.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Revoke every live token of a user (password change, deactivation, deletion)
pub async fn revoke_all_for_user<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<u64, DbErr> {
    let result = RefreshToken::update_many()
        .col_expr(refresh_token::Column::RevokedAt, Expr::value(now()))
        .filter(refresh_token::Column::UserId.eq(user_id))
        .filter(refresh_token::Column::RevokedAt.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Exchange a refresh token for a new pair. Presenting an already rotated
/// token revokes the whole family.
pub async fn refresh(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    keys: &JwtKeys,
    raw_token: &str,
) -> Result<TokenPair, DomainError> {
    let invalid = || DomainError::Unauthorized("Invalid refresh token".to_string());
    let txn = db.begin().await?;

    let token = RefreshToken::find()
        .filter(refresh_token::Column::TokenHash.eq(hash_token(raw_token)))
        .one(&txn)
        .await?
        .ok_or_else(invalid)?;

    if token.revoked_at.is_some() {
        let revoked = revoke_family(&txn, &token.family_id).await?;
        txn.commit().await?;
        tracing::warn!(
            "Refresh token reuse for user {}; revoked {} token(s) in family {}",
            token.user_id,
            revoked,
            token.family_id
        );
        audit.event(
            &Actor {
                user_id: Some(token.user_id),
                username: None,
            },
            "user",
            token.user_id,
            "refresh_token_reuse",
            Some(json!({ "family_id": token.family_id, "revoked": revoked })),
        );
        return Err(DomainError::Unauthorized(
            "Refresh token reuse detected".to_string(),
        ));
    }

    if is_expired(&token.expires_at) {
        return Err(DomainError::Unauthorized("Refresh token expired".to_string()));
    }

    let user = User::find_live()
        .filter(user::Column::Id.eq(token.user_id))
        .one(&txn)
        .await?
        .filter(|u| u.can_sign_in())
        .ok_or_else(invalid)?;

    let (pair, next) = issue_tokens(&txn, keys, &user, Some(token.family_id.clone())).await?;

    let mut old: refresh_token::ActiveModel = token.into();
    old.revoked_at = Set(Some(now()));
    old.replaced_by = Set(Some(next.id));
    old.update(&txn).await?;

    txn.commit().await?;
    Ok(pair)
}

/// Revoke the presented refresh token, if it exists and is live
pub async fn logout(db: &DatabaseConnection, raw_token: Option<&str>) -> Result<(), DomainError> {
    let Some(raw) = raw_token else {
        return Ok(());
    };

    if let Some(token) = RefreshToken::find()
        .filter(refresh_token::Column::TokenHash.eq(hash_token(raw)))
        .filter(refresh_token::Column::RevokedAt.is_null())
        .one(db)
        .await?
    {
        let mut active: refresh_token::ActiveModel = token.into();
        active.revoked_at = Set(Some(now()));
        active.update(db).await?;
    }
    Ok(())
}

pub async fn current_user(db: &DatabaseConnection, user_id: i32) -> Result<UserDto, DomainError> {
    User::find_live()
        .filter(user::Column::Id.eq(user_id))
        .one(db)
        .await?
        .map(UserDto::from)
        .ok_or_else(|| DomainError::not_found("User"))
}

pub async fn change_password(
    db: &DatabaseConnection,
    audit: &AuditLogger,
    user_id: i32,
    current_password: &str,
    new_password: &str,
) -> Result<(), DomainError> {
    let user = User::find_live()
        .filter(user::Column::Id.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;

    if !verify_password(current_password, &user.password_hash).unwrap_or(false) {
        return Err(DomainError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }
    validate_password(new_password)?;

    let password_hash = hash_password(new_password).map_err(DomainError::Internal)?;
    let actor = Actor::user(user.id, &user.username);

    let txn = db.begin().await?;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(now());
    active.update(&txn).await?;
    let revoked = revoke_all_for_user(&txn, user_id).await?;
    txn.commit().await?;

    audit.event(
        &actor,
        "user",
        user_id,
        "password_change",
        Some(json!({ "revoked_sessions": revoked })),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_rules() {
        assert!(validate_username("ana_01").is_ok());
        assert!(validate_username("a.b-c").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn emails_are_normalised() {
        assert_eq!(normalize_email(" Ana@Shop.COM ").unwrap(), "ana@shop.com");
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@shop.com").is_err());
        assert!(normalize_email("a@b@c").is_err());
    }

    #[test]
    fn short_passwords_fail() {
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn unparsable_expiry_counts_as_expired() {
        assert!(is_expired("not a date"));
        assert!(is_expired("2000-01-01T00:00:00+00:00"));
        assert!(!is_expired(&(Utc::now() + chrono::Duration::hours(1)).to_rfc3339()));
    }
}
