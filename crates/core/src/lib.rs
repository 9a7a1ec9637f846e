pub mod clock;
pub mod config;
pub mod driver;
pub mod errors;
pub mod matcher;
pub mod model;
pub mod scheduler;
pub mod session;
pub mod statemachine;
pub mod store;
pub mod validate;

pub use config::Config;
pub use errors::{CoreError, CoreResult};
pub use scheduler::Scheduler;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Opens (creating if needed) the sqlite store at `config.storage_path` and
/// runs pending migrations. Shared by the daemon binary and the test suite.
pub async fn open_store(config: &Config) -> anyhow::Result<SqlitePool> {
    let url = format!("sqlite://{}?mode=rwc", config.storage_path);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
