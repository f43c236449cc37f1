use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::config::AuthConfig;
use crate::domain::{Actor, DomainError};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
/// Refresh cookie is only sent to the auth endpoints
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // user id
    pub username: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i32, DomainError> {
        self.sub
            .parse()
            .map_err(|_| DomainError::Unauthorized("Malformed token subject".to_string()))
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.sub.parse().ok(),
            username: Some(self.username.clone()),
        }
    }
}

/// Signing keys and token lifetimes, shared through application state
#[derive(Clone)]
pub struct JwtKeys {
    inner: Arc<JwtKeysInner>,
}

struct JwtKeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    cookie_secure: bool,
}

impl JwtKeys {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            inner: Arc::new(JwtKeysInner {
                encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
                decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
                access_ttl: Duration::minutes(config.access_token_ttl_minutes),
                refresh_ttl: Duration::days(config.refresh_token_ttl_days),
                cookie_secure: config.cookie_secure,
            }),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.inner.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.inner.refresh_ttl
    }

    pub fn cookie_secure(&self) -> bool {
        self.inner.cookie_secure
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let token = match parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        {
            Some(value) => value
                .strip_prefix("Bearer ")
                .map(str::to_string)
                .ok_or_else(|| {
                    DomainError::Unauthorized("Invalid Authorization header format".to_string())
                })?,
            None => cookie_value(&parts.headers, ACCESS_COOKIE).ok_or_else(|| {
                DomainError::Unauthorized("Missing Authorization header".to_string())
            })?,
        };

        decode_jwt(&keys, &token).map_err(|e| {
            tracing::debug!("Rejected access token: {}", e);
            DomainError::Unauthorized("Invalid or expired token".to_string())
        })
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, String> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| e.to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_jwt(
    keys: &JwtKeys,
    user_id: i32,
    username: &str,
    role: &str,
) -> Result<String, String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(keys.access_ttl())
        .ok_or_else(|| "Token lifetime overflows".to_string())?;

    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_owned(),
        role: role.to_owned(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &keys.inner.encoding).map_err(|e| e.to_string())
}

pub fn decode_jwt(keys: &JwtKeys, token: &str) -> Result<Claims, String> {
    decode::<Claims>(token, &keys.inner.decoding, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| e.to_string())
}

/// 32 random bytes, hex encoded. Handed to the client once.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Storage form of a refresh token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Read a cookie from the `Cookie` request headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
        .filter(|v| !v.is_empty())
}

/// HttpOnly, SameSite=Strict cookie; `max_age` of 0 clears it.
pub fn build_cookie(name: &str, value: &str, path: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Strict",
        name,
        value,
        path,
        max_age_secs.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
