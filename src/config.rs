use derive_more::Display;
use std::env;

/// Runtime settings read from the environment (and `.env`, if present).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub secret_key: String,
    /// Browser session lifetime.
    pub session_time: chrono::Duration,
    pub jwt_access_lifetime: chrono::Duration,
    pub jwt_refresh_lifetime: chrono::Duration,
    /// Page size for API lists and the index page.
    pub page_size: u64,
    pub fixture_dir: String,
}

#[derive(Debug, Display)]
pub enum ConfigError {
    #[display(fmt = "{} MISSING from environment", _0)]
    Missing(&'static str),
    #[display(fmt = "{} cannot be parsed: {}", _0, _1)]
    Invalid(&'static str, String),
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret_key = required("SECRET_KEY")?;
        if secret_key.len() < 32 {
            return Err(ConfigError::Invalid(
                "SECRET_KEY",
                "must be at least 32 bytes long".to_owned(),
            ));
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_owned()),
            secret_key,
            session_time: minutes("SESSION_TIME", 1440)?,
            jwt_access_lifetime: minutes("JWT_ACCESS_LIFETIME", 60)?,
            jwt_refresh_lifetime: minutes("JWT_REFRESH_LIFETIME", 1440)?,
            page_size: positive("PAGE_SIZE", 10)? as u64,
            fixture_dir: env::var("FIXTURE_DIR").unwrap_or_else(|_| "tests/test_data".to_owned()),
        })
    }

    /// Settings for tests and local tooling that never touch the environment.
    pub fn for_database(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_owned(),
            bind_address: "127.0.0.1:8080".to_owned(),
            secret_key: "autoportal-insecure-development-secret-key-0123456789".to_owned(),
            session_time: chrono::Duration::minutes(1440),
            jwt_access_lifetime: chrono::Duration::minutes(60),
            jwt_refresh_lifetime: chrono::Duration::minutes(1440),
            page_size: 10,
            fixture_dir: "tests/test_data".to_owned(),
        }
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn positive(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value
            .parse::<i64>()
            .map_err(|e| ConfigError::Invalid(key, e.to_string()))?,
        Err(_) => default,
    };
    if value <= 0 {
        return Err(ConfigError::Invalid(key, "must be a positive number".to_owned()));
    }
    Ok(value)
}

fn minutes(key: &'static str, default: i64) -> Result<chrono::Duration, ConfigError> {
    positive(key, default).map(chrono::Duration::minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_usable_secret() {
        let config = Config::for_database("sqlite::memory:");
        assert!(config.secret_key.len() >= 32);
        assert_eq!(config.page_size, 10);
    }
}
