use sqlx::SqlitePool;

use crate::clock::{generate_token, hash_token};
use crate::errors::{CoreError, CoreResult};
use crate::model::{normalize_skills, NewWorker, Worker, WorkerStatus};
use crate::store;

/// Result of registering a worker: the stored record plus the bearer token,
/// which is only ever visible at this moment.
pub struct Registration {
    pub worker: Worker,
    pub token: String,
}

pub async fn register_worker(
    pool: &SqlitePool,
    name: String,
    handle: Option<String>,
    skills: Vec<String>,
    capacity_points: i64,
    max_concurrent_tasks: i64,
) -> CoreResult<Registration> {
    let token = generate_token();
    let token_hash = hash_token(&token);

    let new = NewWorker {
        name,
        handle,
        skills: normalize_skills(skills),
        capacity_points,
        max_concurrent_tasks,
    };

    let worker = store::insert_worker(pool, &new, &token_hash).await?;

    store::log_event(
        pool,
        "worker.register",
        Some(&worker.worker_id),
        None,
        None,
        serde_json::json!({ "name": worker.name }),
    )
    .await?;

    Ok(Registration { worker, token })
}

/// Resolves a presented bearer token to its worker, distinguishing a
/// missing credential from one that doesn't map to anyone.
pub async fn authenticate_worker(pool: &SqlitePool, token: Option<&str>) -> CoreResult<Worker> {
    let token = token.ok_or(CoreError::AuthMissing)?;
    if token.is_empty() {
        return Err(CoreError::AuthMissing);
    }
    let token_hash = hash_token(token);
    store::worker_by_token_hash(pool, &token_hash)
        .await?
        .ok_or(CoreError::AuthInvalid)
}

pub async fn heartbeat(
    pool: &SqlitePool,
    worker: &Worker,
    status: WorkerStatus,
    note: Option<&str>,
) -> CoreResult<()> {
    store::update_worker_heartbeat(pool, &worker.worker_id, status, note).await
}
