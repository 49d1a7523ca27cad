use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::config::DbConfig;
use crate::db::{self, bounded};
use crate::error::RepoError;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid database name {0:?}")]
    InvalidDatabaseName(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<sqlx::Error> for SchemaError {
    fn from(e: sqlx::Error) -> Self {
        SchemaError::Repo(e.into())
    }
}

const CREATE_ACCOUNT_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS account (
        id UUID PRIMARY KEY,
        user_id VARCHAR(50) UNIQUE,
        mobile VARCHAR(20) NOT NULL,
        status VARCHAR(16) CHECK (status IN ('active', 'blocked')),
        active BOOLEAN NOT NULL DEFAULT true,
        created TIMESTAMPTZ NOT NULL DEFAULT now(),
        modified TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

const CREATE_CAR_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS car (
        id UUID PRIMARY KEY,
        license_number VARCHAR(20) NOT NULL UNIQUE,
        manufacturer VARCHAR(50) NOT NULL,
        model VARCHAR(50) NOT NULL,
        base_price BIGINT NOT NULL CHECK (base_price >= 0),
        price_per_hour BIGINT NOT NULL CHECK (price_per_hour >= 0),
        security_deposit BIGINT NOT NULL CHECK (security_deposit >= 0),
        available BOOLEAN NOT NULL DEFAULT true,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

const CREATE_BOOKING_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS car_booking (
        id UUID PRIMARY KEY,
        car_id UUID NOT NULL REFERENCES car (id),
        user_id UUID NOT NULL REFERENCES account (id),
        start_at TIMESTAMPTZ NOT NULL,
        end_at TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CHECK (start_at < end_at)
    )
"#;

const CREATE_BOOKING_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS car_booking_car_start_idx
        ON car_booking (car_id, start_at)
"#;

pub(crate) fn is_valid_database_name(name: &str) -> bool {
    lazy_static! {
        static ref DB_NAME_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap();
    }
    DB_NAME_RE.is_match(name)
}

/// Create the application database on the server unless it already exists.
#[instrument(skip(cfg), fields(database = %cfg.name))]
pub async fn create_database(cfg: &DbConfig) -> Result<(), SchemaError> {
    if !is_valid_database_name(&cfg.name) {
        return Err(SchemaError::InvalidDatabaseName(cfg.name.clone()));
    }

    let server = db::create_pool(cfg, None).await?;
    let res = bounded(async {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1)",
        )
        .bind(&cfg.name)
        .fetch_one(&server)
        .await?;
        if exists {
            info!("database already exists");
            return Ok(());
        }

        // identifiers cannot be bound; the name was validated above
        let query = format!(r#"CREATE DATABASE "{}""#, cfg.name);
        let done = sqlx::query(&query).execute(&server).await.map_err(|e| {
            error!(error = %e, query = %query, "unable to execute query");
            e
        })?;
        info!(query = %query, "{} rows affected on running query", done.rows_affected());
        Ok::<_, SchemaError>(())
    })
    .await;

    server.close().await;
    res
}

/// Create every table the service needs. Safe to run repeatedly.
#[instrument(skip(db))]
pub async fn create_tables(db: &PgPool) -> Result<(), SchemaError> {
    for query in [
        CREATE_ACCOUNT_TABLE,
        CREATE_CAR_TABLE,
        CREATE_BOOKING_TABLE,
        CREATE_BOOKING_INDEX,
    ] {
        let done = bounded(async {
            sqlx::query(query)
                .execute(db)
                .await
                .map_err(SchemaError::from)
        })
        .await
        .map_err(|e| {
            error!(error = %e, query = %query.trim(), "unable to create schema object");
            e
        })?;
        info!(query = %query.trim(), "{} rows affected on running query", done.rows_affected());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_names_are_plain_identifiers() {
        assert!(is_valid_database_name("carbooking"));
        assert!(is_valid_database_name("_car_booking_2"));
        assert!(!is_valid_database_name(""));
        assert!(!is_valid_database_name("2cars"));
        assert!(!is_valid_database_name("cars\"; DROP DATABASE x; --"));
        assert!(!is_valid_database_name("car-booking"));
        assert!(!is_valid_database_name(&"a".repeat(64)));
    }

    #[tokio::test]
    async fn invalid_name_is_rejected_before_connecting() {
        let cfg = DbConfig {
            username: "u".into(),
            password: "p".into(),
            host: "127.0.0.1".into(),
            port: 1,
            name: "bad name".into(),
        };
        let err = create_database(&cfg).await.unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDatabaseName(_)));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn schema_creation_is_idempotent() {
        let cfg = crate::config::DbConfig::from_env().expect("DB_* variables required");
        create_database(&cfg).await.expect("create database");
        create_database(&cfg).await.expect("create database again");

        let pool = db::create_pool(&cfg, Some(&cfg.name)).await.expect("pool");
        create_tables(&pool).await.expect("create tables");
        create_tables(&pool).await.expect("create tables again");
    }
}
