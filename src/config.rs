use anyhow::{Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// `None` runs the service against the in-process store.
    pub database: Option<DatabaseConfig>,
    pub app: AppConfig,
    pub enrollment: EnrollmentConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnrollmentConfig {
    /// Extra attempts after a learner profile version conflict.
    pub conflict_retries: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Server configuration
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        // Database configuration (optional)
        let database = match env::var("DATABASE_URL") {
            Ok(url) => {
                let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
                    Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?),
                    Err(_) => Some(10),
                };
                let min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
                    Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?),
                    Err(_) => Some(1),
                };
                Some(DatabaseConfig {
                    url,
                    max_connections,
                    min_connections,
                })
            }
            Err(_) => None,
        };

        // App configuration
        let environment = env::var("APP_ENVIRONMENT")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or_default();
        let name = env::var("APP_NAME").unwrap_or_else(|_| "MicroCourses Backend".to_string());
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|val| parse_list(&val))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let conflict_retries = match env::var("ENROLLMENT_CONFLICT_RETRIES") {
            Ok(val) => val.parse().context("Failed to parse ENROLLMENT_CONFLICT_RETRIES")?,
            Err(_) => 3,
        };

        Ok(Config {
            server: ServerConfig { host, port },
            database,
            app: AppConfig {
                name,
                environment,
                cors_allowed_origins,
            },
            enrollment: EnrollmentConfig { conflict_retries },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == Environment::Production
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing_is_case_insensitive() {
        assert_eq!("Production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("staging".parse::<Environment>(), Ok(Environment::Staging));
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn environment_names_parse_back() {
        for env in [Environment::Development, Environment::Staging, Environment::Production] {
            assert_eq!(env.as_str().parse::<Environment>(), Ok(env));
        }
    }

    #[test]
    fn origin_lists_skip_blank_entries() {
        assert_eq!(
            parse_list(" http://a.test, ,http://b.test "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
