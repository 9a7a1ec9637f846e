use workpool_core::{open_store, Config};

#[tokio::test]
async fn open_store_creates_file_and_applies_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workpool.sqlite3");

    let config = Config {
        storage_path: path.to_str().unwrap().to_string(),
        lease_ttl_seconds: 1800,
        heartbeat_ttl_seconds: 90,
        cycle_interval_seconds: 5,
    };

    let pool = open_store(&config).await.unwrap();
    let repos = workpool_core::store::list_repos(&pool).await.unwrap();
    assert!(repos.is_empty());
    assert!(path.exists());
}
