use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use workpool_core::Config;

/// Fresh, empty in-memory database with migrations applied. Each test gets
/// its own pool, so unlike the teacher's Postgres suite nothing needs
/// `#[serial]` or a shared container.
pub async fn setup_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

pub fn test_config() -> Config {
    Config {
        storage_path: ":memory:".to_string(),
        lease_ttl_seconds: 1800,
        heartbeat_ttl_seconds: 90,
        cycle_interval_seconds: 5,
    }
}
