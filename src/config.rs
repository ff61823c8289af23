use std::net::{IpAddr, SocketAddr};

/// Secret used when `JWT_SECRET` is unset outside production.
const DEV_JWT_SECRET: &str = "dev-only-secret-change-me-dev-only-secret";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: IpAddr,
    pub server_port: u16,
    pub environment: Environment,
    pub log_level: String,
    pub jwt_secret: String,
    /// Lifetime of sessions issued by the user API.
    pub session_ttl_secs: u64,
    /// Lifetime of sessions issued by the admin login.
    pub admin_session_ttl_secs: u64,
    pub frontend_url: String,
    pub admin_url: String,
    /// Period of the maintenance job; `0` disables it.
    pub maintenance_interval_secs: u64,
}

/// Deployment environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `DATABASE_URL`, and `JWT_SECRET` in production.
    /// Optional with defaults: `SERVER_HOST`, `SERVER_PORT`/`PORT`, `ENVIRONMENT`,
    /// `LOG_LEVEL`, `SESSION_TTL_SECS`, `ADMIN_SESSION_TTL_SECS`, `FRONTEND_URL`,
    /// `ADMIN_URL`, `MAINTENANCE_INTERVAL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let environment = match std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let server_port = std::env::var("PORT")
            .or_else(|_| std::env::var("SERVER_PORT"))
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("SERVER_PORT / PORT must be a valid u16"))?;

        let default_host = if environment == Environment::Production {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let server_host = std::env::var("SERVER_HOST")
            .unwrap_or_else(|_| default_host.to_string())
            .parse::<IpAddr>()
            .map_err(|_| anyhow::anyhow!("SERVER_HOST must be a valid IP address"))?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if secret.len() >= 32 => secret,
            Ok(_) => return Err(anyhow::anyhow!("JWT_SECRET must be at least 32 bytes")),
            Err(_) if environment == Environment::Production => {
                return Err(anyhow::anyhow!("JWT_SECRET must be set in production"));
            }
            Err(_) => DEV_JWT_SECRET.to_string(),
        };

        Ok(Self {
            database_url,
            server_host,
            server_port,
            environment,
            log_level,
            jwt_secret,
            session_ttl_secs: env_u64("SESSION_TTL_SECS", 7 * 24 * 3600)?,
            admin_session_ttl_secs: env_u64("ADMIN_SESSION_TTL_SECS", 12 * 3600)?,
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            admin_url: std::env::var("ADMIN_URL")
                .unwrap_or_else(|_| "http://localhost:5174".to_string()),
            maintenance_interval_secs: env_u64("MAINTENANCE_INTERVAL_SECS", 900)?,
        })
    }

    /// Build the socket address for the server to bind to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server_host, self.server_port)
    }
}

fn env_u64(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("{name} must be a non-negative integer")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = Config {
            database_url: String::new(),
            server_host: IpAddr::from([127, 0, 0, 1]),
            server_port: 3000,
            environment: Environment::Development,
            log_level: "info".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            session_ttl_secs: 60,
            admin_session_ttl_secs: 60,
            frontend_url: String::new(),
            admin_url: String::new(),
            maintenance_interval_secs: 0,
        };
        let addr = config.socket_addr();
        assert_eq!(addr.port(), 3000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn env_u64_falls_back_to_default() {
        assert_eq!(
            env_u64("SMM_PANEL_TEST_UNSET_VARIABLE", 42).unwrap_or_default(),
            42
        );
    }
}
