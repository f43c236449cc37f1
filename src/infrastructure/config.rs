use std::env;
use std::time::Duration;

/// Audit buffer tuning
#[derive(Clone, Debug)]
pub struct AuditConfig {
    /// Buffered entries that trigger an immediate flush
    pub flush_threshold: usize,
    pub flush_interval: Duration,
    /// Upper bound on entries kept after failed flushes
    pub max_buffer: usize,
    /// Keys whose values never reach the audit table
    pub sensitive_fields: Vec<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            flush_threshold: 50,
            flush_interval: Duration::from_millis(5000),
            max_buffer: 1000,
            sensitive_fields: DEFAULT_SENSITIVE_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "password_hash",
    "token",
    "token_hash",
    "refresh_token",
    "access_token",
    "secret",
];

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    /// Adds `Secure` to auth cookies
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            cookie_secure: false,
        }
    }
}

/// Credentials for the admin account created on startup
#[derive(Clone, Debug)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub auth: AuthConfig,
    pub audit: AuditConfig,
    pub admin: Option<AdminBootstrap>,
    pub seed_demo: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://stockroom.db?mode=rwc".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
            auth: AuthConfig::default(),
            audit: AuditConfig::default(),
            admin: None,
            seed_demo: false,
        }
    }
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Invalid {} value: {}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Config::default();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if cfg!(debug_assertions) => defaults.auth.jwt_secret.clone(),
            _ => return Err("JWT_SECRET must be set in production".to_string()),
        };

        let admin = match (
            env::var("ADMIN_USERNAME"),
            env::var("ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => Some(AdminBootstrap {
                email: env::var("ADMIN_EMAIL")
                    .unwrap_or_else(|_| format!("{}@localhost", username)),
                username,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: parsed("PORT", defaults.port)?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|s| list(&s))
                .unwrap_or_default(),
            auth: AuthConfig {
                jwt_secret,
                access_token_ttl_minutes: parsed(
                    "ACCESS_TOKEN_TTL_MINUTES",
                    defaults.auth.access_token_ttl_minutes,
                )?,
                refresh_token_ttl_days: parsed(
                    "REFRESH_TOKEN_TTL_DAYS",
                    defaults.auth.refresh_token_ttl_days,
                )?,
                cookie_secure: parsed("COOKIE_SECURE", defaults.auth.cookie_secure)?,
            },
            audit: AuditConfig {
                flush_threshold: parsed("AUDIT_FLUSH_THRESHOLD", defaults.audit.flush_threshold)?
                    .max(1),
                flush_interval: Duration::from_millis(
                    parsed("AUDIT_FLUSH_INTERVAL_MS", 5000u64)?.max(10),
                ),
                max_buffer: parsed("AUDIT_MAX_BUFFER", defaults.audit.max_buffer)?.max(1),
                sensitive_fields: env::var("AUDIT_SENSITIVE_FIELDS")
                    .map(|s| list(&s))
                    .unwrap_or(defaults.audit.sensitive_fields),
            },
            admin,
            seed_demo: env::var("SEED_DEMO").is_ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_trims_and_drops_blanks() {
        assert_eq!(list(" a, b ,,c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn default_sensitive_fields_cover_credentials() {
        let audit = AuditConfig::default();
        assert!(audit.sensitive_fields.iter().any(|f| f == "password_hash"));
        assert!(audit.sensitive_fields.iter().any(|f| f == "refresh_token"));
    }
}
