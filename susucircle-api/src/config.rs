/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `IDENTITY_MODE`: "jwt" or "remote" (default: jwt)
/// - `IDENTITY_JWT_SECRET`: Shared secret for the jwt mode (required in jwt mode)
/// - `IDENTITY_JWT_ISSUER`: Expected token issuer (optional)
/// - `IDENTITY_USERINFO_URL`: Userinfo endpoint for the remote mode
/// - `RUST_LOG`: Log level (default: info)
///
/// # Example
///
/// ```no_run
/// use susucircle_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Identity provider configuration
    pub identity: IdentityConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Which identity-provider adapter to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// Validate provider-signed JWTs locally
    Jwt,

    /// Forward credentials to the provider's userinfo endpoint
    Remote,
}

/// Identity provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Adapter selection
    pub mode: IdentityMode,

    /// Shared secret for the jwt mode
    pub jwt_secret: Option<String>,

    /// Expected issuer for the jwt mode (tokens from other issuers are
    /// rejected when set)
    pub jwt_issuer: Option<String>,

    /// Userinfo endpoint for the remote mode
    pub userinfo_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a number")?;

        let mode = match env::var("IDENTITY_MODE")
            .unwrap_or_else(|_| "jwt".to_string())
            .to_lowercase()
            .as_str()
        {
            "jwt" => IdentityMode::Jwt,
            "remote" => IdentityMode::Remote,
            other => anyhow::bail!("IDENTITY_MODE must be 'jwt' or 'remote', got '{other}'"),
        };

        let identity = IdentityConfig {
            mode,
            jwt_secret: env::var("IDENTITY_JWT_SECRET").ok(),
            jwt_issuer: env::var("IDENTITY_JWT_ISSUER").ok(),
            userinfo_url: env::var("IDENTITY_USERINFO_URL").ok(),
        };

        match identity.mode {
            IdentityMode::Jwt if identity.jwt_secret.is_none() => {
                anyhow::bail!("IDENTITY_JWT_SECRET must be set in jwt mode")
            }
            IdentityMode::Remote if identity.userinfo_url.is_none() => {
                anyhow::bail!("IDENTITY_USERINFO_URL must be set in remote mode")
            }
            _ => {}
        }

        Ok(Config {
            api: ApiConfig {
                host: api_host,
                port: api_port,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            identity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_mode_serde_names() {
        assert_eq!(
            serde_json::to_string(&IdentityMode::Jwt).unwrap(),
            "\"jwt\""
        );
        assert_eq!(
            serde_json::to_string(&IdentityMode::Remote).unwrap(),
            "\"remote\""
        );
    }
}
