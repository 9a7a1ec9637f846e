use std::collections::BTreeSet;

use sqlx::SqlitePool;

use crate::clock::utc_now;
use crate::errors::CoreResult;
use crate::model::Repo;
use crate::store::events::log_event;

/// Creates the repo if it doesn't exist, otherwise updates its policy
/// fields in place. Matches the original's `upsert_repo` (idempotent by
/// repo name, spec §3 invariant).
pub async fn upsert_repo(
    pool: &SqlitePool,
    repo: &str,
    max_open_prs: i64,
    area_locks_enabled: bool,
) -> CoreResult<Repo> {
    sqlx::query(
        r#"
        INSERT INTO repos (repo, max_open_prs, area_locks_enabled, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(repo) DO UPDATE SET
            max_open_prs = excluded.max_open_prs,
            area_locks_enabled = excluded.area_locks_enabled
        "#,
    )
    .bind(repo)
    .bind(max_open_prs)
    .bind(area_locks_enabled)
    .bind(utc_now())
    .execute(pool)
    .await?;

    log_event(
        pool,
        "repo.upsert",
        None,
        Some(repo),
        None,
        serde_json::json!({
            "max_open_prs": max_open_prs,
            "area_locks_enabled": area_locks_enabled,
        }),
    )
    .await?;

    get_repo(pool, repo)
        .await?
        .ok_or(crate::errors::CoreError::NotFound)
}

pub async fn get_repo(pool: &SqlitePool, repo: &str) -> CoreResult<Option<Repo>> {
    let row = sqlx::query_as::<_, Repo>("SELECT * FROM repos WHERE repo = ?1")
        .bind(repo)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn list_repos(pool: &SqlitePool) -> CoreResult<Vec<Repo>> {
    let rows = sqlx::query_as::<_, Repo>("SELECT * FROM repos ORDER BY repo ASC")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Count of tasks currently in `pr_opened` for a repo, used by the matcher's
/// throttle check (spec §4.2, `max_open_prs`).
pub async fn count_open_prs(pool: &SqlitePool, repo: &str) -> CoreResult<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE repo = ?1 AND status = 'pr_opened'")
            .bind(repo)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Areas currently held by a `leased`/`in_progress` task in this repo,
/// used by the matcher's area-lock check (spec §4.1 `locked_areas`). A
/// `blocked` or `pr_opened` task releases its area lock.
pub async fn locked_areas(pool: &SqlitePool, repo: &str) -> CoreResult<BTreeSet<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT area FROM tasks
        WHERE repo = ?1 AND area IS NOT NULL
          AND status IN ('leased', 'in_progress')
        "#,
    )
    .bind(repo)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(a,)| a).collect())
}
