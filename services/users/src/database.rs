//! Schema migrations for the users service

use common::error::DatabaseResult;
use sqlx::PgPool;
use tracing::info;

/// Apply every pending migration from `migrations/`
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    info!("Applying database migrations");

    sqlx::migrate!("./migrations").run(pool).await?;

    info!("Migrations applied successfully");
    Ok(())
}
