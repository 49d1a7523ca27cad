use serde::Deserialize;
use thiserror::Error;

const DEFAULT_DB_PORT: u16 = 5432;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Database credentials, read from `DB_USERNAME`, `DB_PASSWORD`, `DB_HOSTNAME`, `DB_NAME`.
#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub host: String,
    pub port: u16,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let username = required("DB_USERNAME")?;
        let password = required("DB_PASSWORD")?;
        let hostname = required("DB_HOSTNAME")?;
        let name = required("DB_NAME")?;

        let (host, port) = split_host_port(&hostname)?;

        Ok(Self {
            username,
            password,
            host,
            port,
            name,
        })
    }
}

/// Accepts `host`, `host:port`, a bare IPv6 address, or `[v6]:port`.
fn split_host_port(hostname: &str) -> Result<(String, u16), ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: "DB_HOSTNAME",
        value: hostname.to_string(),
    };

    if let Some(rest) = hostname.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = match tail {
            "" => DEFAULT_DB_PORT,
            _ => tail
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .ok_or_else(invalid)?,
        };
        return Ok((host.to_string(), port));
    }

    match hostname.split_once(':') {
        // more than one colon: an unbracketed IPv6 address
        Some((_, rest)) if rest.contains(':') => Ok((hostname.to_string(), DEFAULT_DB_PORT)),
        Some((host, port)) if !host.is_empty() => {
            let port = port.parse::<u16>().map_err(|_| invalid())?;
            Ok((host.to_string(), port))
        }
        Some(_) => Err(invalid()),
        None => Ok((hostname.to_string(), DEFAULT_DB_PORT)),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let db = DbConfig::from_env()?;
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "APP_PORT",
                value: v,
            })?,
            Err(_) => 8080,
        };
        Ok(Self { db, host, port })
    }
}
