use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::clock::{new_id, utc_now};
use crate::errors::CoreResult;
use crate::model::{NewWorker, Worker, WorkerStatus};
use crate::store::events::log_event;

pub async fn insert_worker(
    pool: &SqlitePool,
    new: &NewWorker,
    token_hash: &str,
) -> CoreResult<Worker> {
    let worker_id = new_id("w");
    let now = utc_now();

    sqlx::query(
        r#"
        INSERT INTO workers (
            worker_id, name, handle, skills_json, capacity_points,
            max_concurrent_tasks, status, last_heartbeat, token_hash,
            reputation, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&worker_id)
    .bind(&new.name)
    .bind(&new.handle)
    .bind(Json(&new.skills))
    .bind(new.capacity_points)
    .bind(new.max_concurrent_tasks)
    .bind(WorkerStatus::Idle.as_str())
    .bind(now)
    .bind(token_hash)
    .bind(0.0_f64)
    .bind(now)
    .execute(pool)
    .await?;

    worker_by_id(pool, &worker_id)
        .await?
        .ok_or(crate::errors::CoreError::NotFound)
}

pub async fn worker_by_id(pool: &SqlitePool, worker_id: &str) -> CoreResult<Option<Worker>> {
    let row = sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE worker_id = ?1")
        .bind(worker_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn worker_by_token_hash(pool: &SqlitePool, token_hash: &str) -> CoreResult<Option<Worker>> {
    let row = sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE token_hash = ?1")
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_workers(pool: &SqlitePool) -> CoreResult<Vec<Worker>> {
    let rows = sqlx::query_as::<_, Worker>("SELECT * FROM workers ORDER BY worker_id ASC")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn update_worker_heartbeat(
    pool: &SqlitePool,
    worker_id: &str,
    status: WorkerStatus,
    note: Option<&str>,
) -> CoreResult<()> {
    sqlx::query("UPDATE workers SET last_heartbeat = ?1, status = ?2 WHERE worker_id = ?3")
        .bind(utc_now())
        .bind(status.as_str())
        .bind(worker_id)
        .execute(pool)
        .await?;

    log_event(
        pool,
        "worker.heartbeat",
        Some(worker_id),
        None,
        None,
        serde_json::json!({ "status": status.as_str(), "note": note }),
    )
    .await?;

    Ok(())
}

/// Count of workers whose last heartbeat is within `heartbeat_ttl_seconds`
/// of `now` (spec §6 `workers_online`, derived rather than stored).
pub async fn workers_online_count(
    pool: &SqlitePool,
    now: chrono::DateTime<chrono::Utc>,
    heartbeat_ttl_seconds: i64,
) -> CoreResult<i64> {
    let cutoff = now - chrono::Duration::seconds(heartbeat_ttl_seconds);
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM workers WHERE last_heartbeat IS NOT NULL AND last_heartbeat >= ?1",
    )
    .bind(cutoff)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Sum of `estimate_points` and count of tasks currently occupying this
/// worker's capacity (spec §4.1 `worker_load`): only `leased`/`in_progress`
/// count against capacity; a `blocked` or `pr_opened` task frees it up.
pub async fn worker_load(pool: &SqlitePool, worker_id: &str) -> CoreResult<(i64, i64)> {
    let row: (Option<i64>, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(estimate_points), 0), COUNT(*)
        FROM tasks
        WHERE assigned_worker_id = ?1
          AND status IN ('leased', 'in_progress')
        "#,
    )
    .bind(worker_id)
    .fetch_one(pool)
    .await?;
    Ok((row.0.unwrap_or(0), row.1))
}
