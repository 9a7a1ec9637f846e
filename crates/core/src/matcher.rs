use std::collections::{BTreeSet, HashMap};

use sqlx::SqlitePool;

use crate::clock::utc_now;
use crate::config::Config;
use crate::errors::CoreResult;
use crate::model::{CycleStats, Repo, Worker, WorkerStatus};
use crate::store;

/// Per-repo mutable view the matcher keeps in memory for the duration of
/// one cycle, so later tasks in the same cycle see the effect of earlier
/// leases without a round trip to the store.
struct RepoSnapshot {
    repo: Repo,
    open_prs: i64,
    locked_areas: BTreeSet<String>,
}

/// Per-worker mutable view, same reasoning.
struct WorkerSnapshot {
    worker: Worker,
    used_points: i64,
    used_tasks: i64,
}

/// Runs one scheduling cycle: requeue expired leases, then walk ready tasks
/// in priority order and lease each to its best eligible worker. Mirrors
/// the original pool service's `run_scheduling_cycle` step for step.
pub async fn run_matching_cycle(pool: &SqlitePool, config: &Config) -> CoreResult<CycleStats> {
    let mut stats = CycleStats::default();
    let now = utc_now();

    stats.requeued = store::requeue_expired_leases(pool, now).await?;

    let mut repos: HashMap<String, RepoSnapshot> = HashMap::new();
    for repo in store::list_repos(pool).await? {
        let open_prs = store::count_open_prs(pool, &repo.repo).await?;
        let locked_areas = store::locked_areas(pool, &repo.repo).await?;
        repos.insert(
            repo.repo.clone(),
            RepoSnapshot {
                repo,
                open_prs,
                locked_areas,
            },
        );
    }

    let mut workers: HashMap<String, WorkerSnapshot> = HashMap::new();
    for worker in store::list_workers(pool).await? {
        let (used_points, used_tasks) = store::worker_load(pool, &worker.worker_id).await?;
        workers.insert(
            worker.worker_id.clone(),
            WorkerSnapshot {
                worker,
                used_points,
                used_tasks,
            },
        );
    }

    let ready_tasks = store::list_ready_tasks(pool).await?;

    for task in ready_tasks {
        let Some(repo_snap) = repos.get(&task.repo) else {
            stats.skipped_no_worker += 1;
            continue;
        };

        if repo_snap.open_prs >= repo_snap.repo.max_open_prs {
            stats.skipped_throttle += 1;
            continue;
        }

        if repo_snap.repo.area_locks_enabled {
            if let Some(area) = &task.area {
                if repo_snap.locked_areas.contains(area) {
                    stats.skipped_area_lock += 1;
                    continue;
                }
            }
        }

        let required_skills = task.required_skills();

        let mut candidates: Vec<&str> = workers
            .values()
            .filter(|w| w.worker.is_online(now, config.heartbeat_ttl_seconds))
            .filter(|w| w.worker.status() != WorkerStatus::Paused)
            .filter(|w| required_skills.is_subset(&w.worker.skills()))
            .filter(|w| w.used_points + task.estimate_points <= w.worker.capacity_points)
            .filter(|w| w.used_tasks + 1 <= w.worker.max_concurrent_tasks)
            .map(|w| w.worker.worker_id.as_str())
            .collect();

        if candidates.is_empty() {
            stats.skipped_no_worker += 1;
            continue;
        }

        candidates.sort_by(|a, b| {
            let wa = &workers[*a];
            let wb = &workers[*b];
            rank_key(wa).cmp(&rank_key(wb))
        });

        let chosen_id = candidates[0].to_string();

        let leased = store::lease_task(pool, &task.task_id, &chosen_id, config.lease_ttl_seconds)
            .await?;
        if !leased {
            continue;
        }

        store::log_event(
            pool,
            "task.leased",
            Some(&chosen_id),
            Some(&task.repo),
            Some(&task.task_id),
            serde_json::json!({ "attempt": task.attempt }),
        )
        .await?;

        stats.assigned += 1;

        let entry = workers.get_mut(&chosen_id).expect("candidate came from snapshot");
        entry.used_points += task.estimate_points;
        entry.used_tasks += 1;

        if let Some(area) = &task.area {
            if let Some(repo_snap) = repos.get_mut(&task.repo) {
                repo_snap.locked_areas.insert(area.clone());
            }
        }
    }

    Ok(stats)
}

/// Ascending sort key: fewest points in flight, fewest tasks in flight,
/// highest reputation, then the raw heartbeat timestamp ascending — matching
/// the literal (un-negated) `last_heartbeat` string comparison ground-truth
/// scheduling does, not the tie-break's own prose rationale. A worker with no
/// heartbeat on record sorts as if its timestamp were the empty string, i.e.
/// first, same as ground truth's `last_heartbeat or ""`.
fn rank_key(w: &WorkerSnapshot) -> (i64, i64, i64, i64) {
    let reputation_desc = -(w.worker.reputation * 1_000_000.0) as i64;
    let heartbeat_key = w
        .worker
        .last_heartbeat
        .map(|hb| hb.timestamp())
        .unwrap_or(i64::MIN);
    (w.used_points, w.used_tasks, reputation_desc, heartbeat_key)
}
