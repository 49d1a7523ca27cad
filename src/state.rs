use crate::config::DbConfig;
use crate::db;
use anyhow::Context;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

impl AppState {
    pub async fn init(config: &DbConfig) -> anyhow::Result<Self> {
        let db = db::create_pool(config, Some(&config.name))
            .await
            .with_context(|| format!("connect to database {}", config.name))?;
        Ok(Self { db })
    }

    /// State backed by a pool that never connects until used.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = DbConfig {
            username: "postgres".into(),
            password: "postgres".into(),
            host: "127.0.0.1".into(),
            port: 1,
            name: "carbooking_test".into(),
        };
        let options = db::connect_options(&config, Some(&config.name));
        let db = db::pool_options().connect_lazy_with(options);
        Self { db }
    }
}
