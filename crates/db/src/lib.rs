use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

pub mod models;
pub mod repositories;

pub use repositories::PgPropertyStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply the embedded migrations in `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Round-trip a trivial query to verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| ())
}

/// A [`campos_core::store::PropertyStore`] backed by `pool`.
pub fn property_store(pool: DbPool) -> Arc<PgPropertyStore> {
    Arc::new(PgPropertyStore::new(pool))
}
