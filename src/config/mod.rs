use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which persistence backend the server talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    /// Pool acquire timeout in seconds
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    /// Allowed client origins; a single "*" allows any origin
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

/// Tokens are valid for a fixed 30 days unless overridden
const DEFAULT_JWT_EXPIRY_HOURS: u64 = 24 * 30;

/// Deployed browser client
const CLIENT_ORIGIN: &str = "https://excel-analytics-project-1.onrender.com";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("CHARTSHEET_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.database.backend = parse_backend(&v).unwrap_or(self.database.backend);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = parse_origins(&v);
        }
        // JWT_KEY is the name older deployments used for the same secret
        if let Ok(v) = env::var("JWT_SECRET").or_else(|_| env::var("JWT_KEY")) {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "chartsheet-development-secret".to_string(),
                jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![CLIENT_ORIGIN.to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![CLIENT_ORIGIN.to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
            },
        }
    }

    /// In-memory configuration used by tests and local experiments
    pub fn in_memory(jwt_secret: impl Into<String>) -> Self {
        let mut config = Self::development();
        config.database.backend = StoreBackend::Memory;
        config.database.run_migrations = false;
        config.security.jwt_secret = jwt_secret.into();
        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_backend(value: &str) -> Option<StoreBackend> {
    match value.trim().to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" | "pg" => Some(StoreBackend::Postgres),
        "memory" | "mem" => Some(StoreBackend::Memory),
        _ => None,
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.backend, StoreBackend::Postgres);
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 720);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.run_migrations);
        assert!(!config.api.enable_request_logging);
    }

    #[test]
    fn deployed_presets_allow_the_client_origin() {
        for config in [AppConfig::staging(), AppConfig::production()] {
            assert_eq!(
                config.security.cors_origins,
                vec!["https://excel-analytics-project-1.onrender.com".to_string()]
            );
        }
    }

    #[test]
    fn in_memory_config_uses_given_secret() {
        let config = AppConfig::in_memory("s3cret");
        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.security.jwt_secret, "s3cret");
    }

    #[test]
    fn parses_backend_names() {
        assert_eq!(parse_backend("Postgres"), Some(StoreBackend::Postgres));
        assert_eq!(parse_backend(" memory "), Some(StoreBackend::Memory));
        assert_eq!(parse_backend("mongo"), None);
    }

    #[test]
    fn parses_origin_lists() {
        assert_eq!(
            parse_origins("https://a.example, ,https://b.example "),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }
}
