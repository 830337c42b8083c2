/// Configuration management for Cinelog
use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub admin: Option<AdminConfig>,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file, or `:memory:`
    pub database: PathBuf,
    pub max_connections: u32,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_expiration: u64,
}

/// Bootstrap administrator, created at startup when all three values are set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Pagination defaults for list endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_size: 25,
            max_size: 100,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> CatalogResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("CINELOG_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("CINELOG_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| CatalogError::Validation("Invalid port number".to_string()))?;

        let database = env::var("CINELOG_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data/cinelog.sqlite"));
        let max_connections = env::var("CINELOG_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let jwt_secret = env::var("CINELOG_JWT_SECRET")
            .map_err(|_| CatalogError::Validation("JWT secret required".to_string()))?;
        let access_expiration = env::var("CINELOG_JWT_ACCESS_EXPIRATION_SECS")
            .unwrap_or_else(|_| "900".to_string())
            .parse()
            .map_err(|_| CatalogError::Validation("Invalid access token expiration".to_string()))?;

        // All three must be present, otherwise no admin is bootstrapped
        let admin = match (
            env::var("CINELOG_ADMIN_NAME"),
            env::var("CINELOG_ADMIN_EMAIL"),
            env::var("CINELOG_ADMIN_PASSWORD"),
        ) {
            (Ok(name), Ok(email), Ok(password))
                if !name.is_empty() && !email.is_empty() && !password.is_empty() =>
            {
                Some(AdminConfig {
                    name,
                    email,
                    password,
                })
            }
            _ => None,
        };

        let default_size = env::var("CINELOG_PAGINATION_DEFAULT_SIZE")
            .unwrap_or_else(|_| "25".to_string())
            .parse()
            .unwrap_or(25);
        let max_size = env::var("CINELOG_PAGINATION_MAX_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);

        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("CINELOG_LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            other => {
                return Err(CatalogError::Validation(format!(
                    "Invalid log format: {}",
                    other
                )))
            }
        };

        Ok(ServerConfig {
            service: ServiceConfig { hostname, port },
            storage: StorageConfig {
                database,
                max_connections,
            },
            authentication: AuthConfig {
                jwt_secret,
                access_expiration,
            },
            admin,
            pagination: PaginationConfig {
                default_size,
                max_size,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> CatalogResult<()> {
        if self.service.hostname.is_empty() {
            return Err(CatalogError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.jwt_secret.len() < 32 {
            return Err(CatalogError::Validation(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.access_expiration == 0 {
            return Err(CatalogError::Validation(
                "Access token expiration must be positive".to_string(),
            ));
        }

        if self.storage.max_connections == 0 {
            return Err(CatalogError::Validation(
                "Database pool needs at least one connection".to_string(),
            ));
        }

        let pagination = &self.pagination;
        if pagination.default_size == 0 || pagination.default_size > pagination.max_size {
            return Err(CatalogError::Validation(format!(
                "Pagination default size must be within 1..={}",
                pagination.max_size
            )));
        }

        Ok(())
    }

    /// Configuration for an in-memory instance
    pub fn for_testing(jwt_secret: &str) -> Self {
        ServerConfig {
            service: ServiceConfig {
                hostname: "127.0.0.1".to_string(),
                port: 0,
            },
            storage: StorageConfig {
                database: PathBuf::from(crate::db::MEMORY_DATABASE),
                max_connections: 1,
            },
            authentication: AuthConfig {
                jwt_secret: jwt_secret.to_string(),
                access_expiration: 900,
            },
            admin: None,
            pagination: PaginationConfig {
                default_size: 2,
                max_size: 50,
            },
            logging: LoggingConfig {
                level: "error".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_testing_config_is_valid() {
        let config = ServerConfig::for_testing(SECRET);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = ServerConfig::for_testing("short");
        assert!(matches!(
            config.validate(),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn test_pagination_default_above_max_rejected() {
        let mut config = ServerConfig::for_testing(SECRET);
        config.pagination = PaginationConfig {
            default_size: 60,
            max_size: 50,
        };
        assert!(config.validate().is_err());
    }
}
