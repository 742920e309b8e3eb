/// Configuration management for posts-service
///
/// This module loads configuration from environment variables. `main` loads a
/// `.env` file first, so local overrides live there.
use serde::{Deserialize, Serialize};

const DEV_JWT_SECRET: &str = "dev-only-posts-secret";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Listing configuration
    pub listing: ListingConfig,
    /// Identity token configuration
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// Which store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
    pub backend: StoreBackend,
}

/// Listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Posts per listing page, at least 1
    pub items_per_page: usize,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth subsystem
    pub jwt_secret: String,
    /// Where anonymous users are sent for protected pages
    pub login_url: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("POSTS_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("POSTS_SERVICE_PORT", 8080)?,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/posts".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                backend: parse_backend()?,
            },
            listing: {
                let items_per_page: usize = parse_env_or_default("ITEMS_PER_PAGE", 10)?;
                if items_per_page < 1 {
                    return Err("ITEMS_PER_PAGE must be at least 1".to_string());
                }
                ListingConfig { items_per_page }
            },
            auth: {
                let jwt_secret = match std::env::var("AUTH_JWT_SECRET") {
                    Ok(value) if !value.trim().is_empty() => value,
                    _ if production => {
                        return Err("AUTH_JWT_SECRET must be set in production".to_string())
                    }
                    _ => DEV_JWT_SECRET.to_string(),
                };

                AuthConfig {
                    jwt_secret,
                    login_url: std::env::var("LOGIN_URL")
                        .unwrap_or_else(|_| "/auth/login/".to_string()),
                }
            },
        })
    }
}

fn parse_backend() -> Result<StoreBackend, String> {
    match std::env::var("STORE_BACKEND") {
        Err(_) => Ok(StoreBackend::Postgres),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "" | "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        },
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "APP_ENV",
        "POSTS_SERVICE_HOST",
        "POSTS_SERVICE_PORT",
        "DATABASE_URL",
        "DATABASE_MAX_CONNECTIONS",
        "ITEMS_PER_PAGE",
        "AUTH_JWT_SECRET",
        "LOGIN_URL",
        "STORE_BACKEND",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_in_development() {
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 8080);
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.listing.items_per_page, 10);
        assert_eq!(config.auth.login_url, "/auth/login/");
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert!(!config.app.is_production());
    }

    #[test]
    #[serial]
    fn items_per_page_must_be_positive() {
        clear_env();
        std::env::set_var("ITEMS_PER_PAGE", "0");
        assert!(Config::from_env().is_err());

        std::env::set_var("ITEMS_PER_PAGE", "ten");
        assert!(Config::from_env().is_err());

        std::env::set_var("ITEMS_PER_PAGE", "15");
        assert_eq!(Config::from_env().unwrap().listing.items_per_page, 15);
        clear_env();
    }

    #[test]
    #[serial]
    fn production_requires_jwt_secret() {
        clear_env();
        std::env::set_var("APP_ENV", "production");
        assert!(Config::from_env().is_err());

        std::env::set_var("AUTH_JWT_SECRET", "s3cret");
        let config = Config::from_env().unwrap();
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert!(!format!("{:?}", config.auth).contains("s3cret"));
        clear_env();
    }

    #[test]
    #[serial]
    fn store_backend_is_parsed() {
        clear_env();
        std::env::set_var("STORE_BACKEND", "Memory");
        assert_eq!(
            Config::from_env().unwrap().database.backend,
            StoreBackend::Memory
        );

        std::env::set_var("STORE_BACKEND", "redis");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
