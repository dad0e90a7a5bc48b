//! Job Store: the single source of truth for job state.
//!
//! The [`store::JobStore`] trait is the seam every other crate codes
//! against. [`store::PgJobStore`] backs it with PostgreSQL;
//! [`store::MemoryJobStore`] backs it with an in-process map for tests
//! and single-process deployments.

pub mod models;
pub mod store;

pub use store::{ClaimOutcome, JobStore, MemoryJobStore, PgJobStore, StoreError};

/// Convenience alias used across the workspace.
pub type DbPool = sqlx::PgPool;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
