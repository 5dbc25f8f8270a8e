//! SQLite repositories
//!
//! Free async functions over a `SqlitePool`, grouped per table.

pub mod anomalies;
pub mod audit;
pub mod events;
pub mod insights;
pub mod integrations;
pub mod metrics;
pub mod score_history;
pub mod snapshots;
pub mod weightings;

// In-memory SQLite gives every connection its own database, so the
// test pool is pinned to a single connection.
#[cfg(test)]
pub(crate) async fn setup_test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query(super::schema::SCHEMA)
        .execute(&pool)
        .await
        .unwrap();
    pool
}
