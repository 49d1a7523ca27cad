use std::future::Future;
use std::time::Duration;

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, PgPool, Postgres, Transaction,
};
use tracing::{error, info, instrument, warn};

use crate::config::DbConfig;
use crate::error::RepoError;

pub const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(3 * 60);
pub const MAX_OPEN_CONNECTIONS: u32 = 10;
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Wall-clock budget for every database operation.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const SERVER_DATABASE: &str = "postgres";

/// Connection options for `database`; `None` addresses the server itself.
pub fn connect_options(cfg: &DbConfig, database: Option<&str>) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.username)
        .password(&cfg.password)
        .database(database.unwrap_or(SERVER_DATABASE))
}

pub fn pool_options() -> PgPoolOptions {
    // idle connections are capped by the open limit and evicted after IDLE_TIMEOUT
    PgPoolOptions::new()
        .max_connections(MAX_OPEN_CONNECTIONS)
        .max_lifetime(CONNECTION_MAX_LIFETIME)
        .idle_timeout(IDLE_TIMEOUT)
        .acquire_timeout(QUERY_TIMEOUT)
}

pub async fn create_pool(cfg: &DbConfig, database: Option<&str>) -> Result<PgPool, RepoError> {
    let pool = pool_options()
        .connect_with(connect_options(cfg, database))
        .await
        .map_err(|e| {
            error!(
                error = %e,
                database = database.unwrap_or(SERVER_DATABASE),
                "unable to create database client"
            );
            e
        })?;
    Ok(pool)
}

/// Run `fut` under [`QUERY_TIMEOUT`]; on expiry the future is dropped and a timeout error returned.
pub async fn bounded<F, T, E>(fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<RepoError>,
{
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(res) => res,
        Err(_) => Err(RepoError::Timeout(QUERY_TIMEOUT).into()),
    }
}

/// Explicitly roll back `tx` after a failed statement.
pub async fn rollback(tx: Transaction<'_, Postgres>, action: &str) {
    info!("rolling back transaction to {action} as the database query could not be executed");
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}

#[instrument(skip(db))]
pub async fn ping(db: &PgPool) -> Result<(), RepoError> {
    bounded(async {
        let mut conn = db.acquire().await?;
        conn.ping().await?;
        Ok::<_, RepoError>(())
    })
    .await
    .map_err(|e| {
        error!(error = %e, "unable to ping database");
        e
    })
}
