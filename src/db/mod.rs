pub mod activity;
pub mod assignments;
pub mod coaches;
pub mod dashboard;
pub mod notifications;
pub mod plans;
pub mod subscriptions;
pub mod tokens;
pub mod users;

use sqlx::migrate::MigrateError;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool).await.expect("Failed to migrate");
    pool
}
