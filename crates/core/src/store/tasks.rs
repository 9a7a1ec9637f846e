use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::clock::{new_id, utc_now};
use crate::errors::CoreResult;
use crate::model::{Artifact, NewTask, Task, TaskStatus};

pub async fn insert_task(pool: &SqlitePool, new: &NewTask) -> CoreResult<Task> {
    let task_id = new_id("t");
    let now = utc_now();

    sqlx::query(
        r#"
        INSERT INTO tasks (
            task_id, repo, title, description, estimate_points, priority,
            required_skills_json, area, tier, status, assigned_worker_id,
            leased_at, lease_expires_at, message, artifact_json, attempt,
            updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, NULL, NULL, NULL, NULL,
            NULL, 0, ?11
        )
        "#,
    )
    .bind(&task_id)
    .bind(&new.repo)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.estimate_points)
    .bind(new.priority)
    .bind(Json(&new.required_skills))
    .bind(&new.area)
    .bind(new.tier)
    .bind(TaskStatus::Ready.as_str())
    .bind(now)
    .execute(pool)
    .await?;

    get_task(pool, &task_id)
        .await?
        .ok_or(crate::errors::CoreError::NotFound)
}

pub async fn get_task(pool: &SqlitePool, task_id: &str) -> CoreResult<Option<Task>> {
    let row = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE task_id = ?1")
        .bind(task_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Tasks currently held by a worker: status in {leased, in_progress,
/// blocked, pr_opened} (spec §4.1 `list_tasks_for_worker`, §6 `work_for`).
/// A `merged` task keeps `assigned_worker_id` set but is no longer "held".
pub async fn list_tasks_for_worker(pool: &SqlitePool, worker_id: &str) -> CoreResult<Vec<Task>> {
    let rows = sqlx::query_as::<_, Task>(
        r#"
        SELECT * FROM tasks
        WHERE assigned_worker_id = ?1
          AND status IN ('leased', 'in_progress', 'blocked', 'pr_opened')
        ORDER BY updated_at DESC
        "#,
    )
    .bind(worker_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Ready tasks in the exact order the matcher must consider them:
/// priority descending, estimate ascending, task id ascending as the final
/// deterministic tiebreak (spec §4.2).
pub async fn list_ready_tasks(pool: &SqlitePool) -> CoreResult<Vec<Task>> {
    let rows = sqlx::query_as::<_, Task>(
        r#"
        SELECT * FROM tasks
        WHERE status = 'ready'
        ORDER BY priority DESC, estimate_points ASC, task_id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Atomically leases a ready task to a worker. Returns `false` (no error)
/// if the task was no longer `ready` when the statement ran — the internal
/// "conflict" outcome from spec §7, handled by the caller skipping ahead.
/// `attempt` is untouched here: it counts requeues, not leases.
pub async fn lease_task(
    pool: &SqlitePool,
    task_id: &str,
    worker_id: &str,
    lease_ttl_seconds: i64,
) -> CoreResult<bool> {
    let now = utc_now();
    let expires = now + chrono::Duration::seconds(lease_ttl_seconds);

    let result = sqlx::query(
        r#"
        UPDATE tasks SET
            status = 'leased',
            assigned_worker_id = ?1,
            leased_at = ?2,
            lease_expires_at = ?3,
            message = NULL,
            artifact_json = NULL,
            updated_at = ?2
        WHERE task_id = ?4 AND status = 'ready'
        "#,
    )
    .bind(worker_id)
    .bind(now)
    .bind(expires)
    .bind(task_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Writes a worker-driven status transition. Transition legality is the
/// state machine's job (`core::statemachine`); this just persists the new
/// state plus optional message/artifact.
pub async fn update_task_status(
    pool: &SqlitePool,
    task_id: &str,
    new_status: TaskStatus,
    message: Option<&str>,
    artifact: Option<&Artifact>,
) -> CoreResult<Task> {
    sqlx::query(
        r#"
        UPDATE tasks SET
            status = ?1,
            message = ?2,
            artifact_json = ?3,
            updated_at = ?4
        WHERE task_id = ?5
        "#,
    )
    .bind(new_status.as_str())
    .bind(message)
    .bind(artifact.map(Json))
    .bind(utc_now())
    .bind(task_id)
    .execute(pool)
    .await?;

    get_task(pool, task_id)
        .await?
        .ok_or(crate::errors::CoreError::NotFound)
}

/// Moves any `leased`/`in_progress` task whose lease has strictly expired
/// back to `ready`, clearing the assignment and bumping `attempt`. Emits a
/// `task.requeued` event per row, same as a requeue sweep reported one at a
/// time. Returns the number requeued.
pub async fn requeue_expired_leases(pool: &SqlitePool, now: DateTime<Utc>) -> CoreResult<u64> {
    let expired: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT task_id FROM tasks
        WHERE status IN ('leased', 'in_progress') AND lease_expires_at < ?1
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    if expired.is_empty() {
        return Ok(0);
    }

    for (task_id,) in &expired {
        sqlx::query(
            r#"
            UPDATE tasks SET
                status = 'ready',
                assigned_worker_id = NULL,
                leased_at = NULL,
                lease_expires_at = NULL,
                message = 'requeued (lease expired)',
                attempt = attempt + 1,
                updated_at = ?1
            WHERE task_id = ?2
            "#,
        )
        .bind(now)
        .bind(task_id)
        .execute(pool)
        .await?;

        crate::store::events::log_event(
            pool,
            "task.requeued",
            None,
            None,
            Some(task_id),
            serde_json::json!({ "reason": "lease_expired" }),
        )
        .await?;
    }

    Ok(expired.len() as u64)
}

pub async fn counts_by_status(
    pool: &SqlitePool,
    repo: Option<&str>,
) -> CoreResult<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> = match repo {
        Some(repo) => {
            sqlx::query_as(
                "SELECT status, COUNT(*) FROM tasks WHERE repo = ?1 GROUP BY status",
            )
            .bind(repo)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}
