use crate::config::database::PostgresSettings;
use crate::app_errors::DefaultContext;
use secrecy::ExposeSecret;
use sqlx::{migrate, PgConnection};
use tracing::info;

pub use sqlx::PgPool;

/// Borrowed connection paired with the data a family of queries works on.
pub struct PgQuery<'c, T> {
    pub payload: T,
    pub conn: &'c mut PgConnection,
}

impl<'c, T> PgQuery<'c, T> {
    pub fn new(payload: T, conn: &'c mut PgConnection) -> Self {
        Self { payload, conn }
    }
}

pub async fn get_postgres_pool(config: PostgresSettings) -> Result<PgPool, anyhow::Error> {
    let pool = PgPool::connect(config.database_url.expose_secret())
        .await
        .dc()?;
    if config.is_migrating {
        info!("Running migrations");
        migrate!("./migrations").run(&pool).await.dc()?;
    }
    Ok(pool)
}
