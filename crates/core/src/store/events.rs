use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::clock::utc_now;
use crate::errors::CoreResult;
use crate::model::Event;

/// Appends one row to the audit log (spec §3 `events`, append-only). Event
/// kinds each build `details` through their own call site so the JSON shape
/// is fixed per kind even though the column itself is untyped.
pub async fn log_event(
    pool: &SqlitePool,
    event_type: &str,
    actor_worker_id: Option<&str>,
    repo: Option<&str>,
    task_id: Option<&str>,
    details: serde_json::Value,
) -> CoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO events (ts, type, actor_worker_id, repo, task_id, details_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(utc_now())
    .bind(event_type)
    .bind(actor_worker_id)
    .bind(repo)
    .bind(task_id)
    .bind(Json(details))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_events_for_task(pool: &SqlitePool, task_id: &str) -> CoreResult<Vec<Event>> {
    let rows = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE task_id = ?1 ORDER BY ts ASC, id ASC",
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_events_for_repo(pool: &SqlitePool, repo: &str) -> CoreResult<Vec<Event>> {
    let rows = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE repo = ?1 ORDER BY ts ASC, id ASC",
    )
    .bind(repo)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
