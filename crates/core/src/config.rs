// Config is a central place for runtime configuration: it loads values from
// environment variables and gives callers a typed, validated struct instead
// of raw strings scattered through the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    pub storage_path: String,
    pub lease_ttl_seconds: i64,
    pub heartbeat_ttl_seconds: i64,
    pub cycle_interval_seconds: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage_path = std::env::var("WORKPOOL_STORAGE_PATH")
            .unwrap_or_else(|_| "workpool.sqlite3".to_string());

        let lease_ttl_seconds = env_i64("WORKPOOL_LEASE_TTL_SECONDS").unwrap_or(1800);
        let heartbeat_ttl_seconds = env_i64("WORKPOOL_HEARTBEAT_TTL_SECONDS").unwrap_or(90);
        let cycle_interval_seconds = env_i64("WORKPOOL_CYCLE_INTERVAL_SECONDS")
            .unwrap_or(5)
            .max(1) as u64;

        Ok(Self {
            storage_path,
            lease_ttl_seconds,
            heartbeat_ttl_seconds,
            cycle_interval_seconds,
        })
    }
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
